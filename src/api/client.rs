//! Scenes API client.
//!
//! Maps HTTP status codes onto the typed [`ApiErrorKind`] taxonomy and
//! folds every transport-level or schema-level failure into
//! `internal_server_error` so transport details never leak upward.

use log::{debug, warn};
use reqwest::StatusCode;

use crate::api::models::SceneDocument;
use crate::error::{ApiError, ApiErrorKind};

const DEFAULT_BASE_URL: &str = "https://api.reflct.app";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    apikey: String,
}

impl ApiClient {
    pub fn new(apikey: Option<String>) -> Self {
        Self::with_base_url(apikey, None)
    }

    pub fn with_base_url(apikey: Option<String>, base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            apikey: apikey.unwrap_or_default(),
        }
    }

    pub async fn get_scene(&self, scene_id: &str) -> Result<SceneDocument, ApiError> {
        let url = format!("{}/api/scenes/public/{}", self.base_url, scene_id);
        self.fetch_scene(&url).await
    }

    pub async fn get_preview_scene(&self, scene_id: &str) -> Result<SceneDocument, ApiError> {
        let url = format!("{}/api/scenes/preview/{}", self.base_url, scene_id);
        self.fetch_scene(&url).await
    }

    async fn fetch_scene(&self, url: &str) -> Result<SceneDocument, ApiError> {
        debug!("fetching scene from {url}");

        let response = self
            .http
            .get(url)
            .header("Authorization", format!("apikey {}", self.apikey))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("scene fetch returned HTTP {status}");
            return Err(error_for_status(status));
        }

        let document: SceneDocument = response
            .json()
            .await
            .map_err(|err| ApiError::internal(format!("malformed scene document: {err}")))?;

        document
            .validate()
            .map_err(|reason| ApiError::internal(format!("invalid scene document: {reason}")))?;

        Ok(document)
    }
}

fn error_for_status(status: StatusCode) -> ApiError {
    match status.as_u16() {
        404 => ApiError::new(ApiErrorKind::SceneNotFound, "Scene could not be found."),
        403 => ApiError::new(
            ApiErrorKind::IntegrationNotAllowed,
            "Integration is not allowed for this tier",
        ),
        402 => ApiError::new(
            ApiErrorKind::IntegrationNotEnabled,
            "Scene integration needs to be enabled to be accessed.",
        ),
        401 => ApiError::new(ApiErrorKind::InvalidApikey, "The provided API key is invalid."),
        400 => ApiError::new(
            ApiErrorKind::InvalidSceneId,
            "The provided scene ID is not in the correct format",
        ),
        _ => ApiError::internal("There was an error when fetching the content"),
    }
}
