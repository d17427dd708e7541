use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Discriminator for scene-fetch failures. The wire names match the
/// backend's error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    SceneNotFound,
    InvalidApikey,
    InvalidSceneId,
    InternalServerError,
    IntegrationNotAllowed,
    IntegrationNotEnabled,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiErrorKind::SceneNotFound => "scene_not_found",
            ApiErrorKind::InvalidApikey => "invalid_apikey",
            ApiErrorKind::InvalidSceneId => "invalid_scene_id",
            ApiErrorKind::InternalServerError => "internal_server_error",
            ApiErrorKind::IntegrationNotAllowed => "integration_not_allowed",
            ApiErrorKind::IntegrationNotEnabled => "integration_not_enabled",
        };
        f.write_str(name)
    }
}

/// Typed scene-fetch error. Transport-level failures never leak through:
/// they are folded into `InternalServerError` before reaching the caller.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InternalServerError, message)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::internal(format!("request failed: {err}"))
    }
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("scene document invalid: {0}")]
    InvalidDocument(String),

    #[error("asset {item_id} failed to load: {reason}")]
    AssetLoad { item_id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl ViewerError {
    /// The `kind` surfaced to `on_error` consumers. Document validation
    /// failures count as internal errors per the fetch contract.
    pub fn api_kind(&self) -> ApiErrorKind {
        match self {
            ViewerError::Api(err) => err.kind,
            _ => ApiErrorKind::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_wire_format() {
        assert_eq!(ApiErrorKind::SceneNotFound.to_string(), "scene_not_found");
        assert_eq!(ApiErrorKind::InvalidApikey.to_string(), "invalid_apikey");
        assert_eq!(
            ApiErrorKind::IntegrationNotEnabled.to_string(),
            "integration_not_enabled"
        );
    }

    #[test]
    fn validation_failures_report_internal_error_kind() {
        let err = ViewerError::InvalidDocument("bad camera".into());
        assert_eq!(err.api_kind(), ApiErrorKind::InternalServerError);
    }
}
