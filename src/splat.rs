//! Splat asset loading.
//!
//! Scene items reference `.splat` resources by URL. Downloads run on
//! background tokio tasks and report through a channel the viewer drains
//! once per frame; a failed item never blocks the others.

use std::sync::mpsc::Sender;

use bytemuck::{Pod, Zeroable};
use log::{debug, info, warn};
use nalgebra_glm as glm;

use crate::error::ViewerError;

/// One record of the `.splat` format: position, scale, color and a
/// quantized rotation quaternion, 32 bytes packed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SplatPoint {
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub color: [u8; 4],
    pub rotation: [u8; 4],
}

pub const SPLAT_RECORD_SIZE: usize = std::mem::size_of::<SplatPoint>();

/// A fully parsed splat resource.
#[derive(Debug, Clone)]
pub struct SplatCloud {
    pub points: Vec<SplatPoint>,
}

impl SplatCloud {
    pub fn parse(item_id: &str, bytes: &[u8]) -> Result<Self, ViewerError> {
        if bytes.len() % SPLAT_RECORD_SIZE != 0 {
            return Err(ViewerError::AssetLoad {
                item_id: item_id.to_string(),
                reason: format!(
                    "{} bytes is not a whole number of {SPLAT_RECORD_SIZE}-byte records",
                    bytes.len()
                ),
            });
        }

        // The source buffer has no alignment guarantee.
        let points = bytes
            .chunks_exact(SPLAT_RECORD_SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect();

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Subsampled centers used as click-select candidates. Feeding every
    /// center to the picker is wasteful for multi-million-point clouds.
    pub fn pick_points(&self, stride: usize) -> impl Iterator<Item = glm::Vec3> + '_ {
        self.points
            .iter()
            .step_by(stride.max(1))
            .map(|p| glm::make_vec3(&p.position))
    }
}

/// Messages sent from loader tasks back to the frame loop.
pub enum AssetMessage {
    Progress {
        item_id: String,
        loaded: u64,
        total: Option<u64>,
    },
    Loaded {
        item_id: String,
        cloud: SplatCloud,
    },
    Failed {
        item_id: String,
        error: ViewerError,
    },
}

/// Spawn a background download for one scene item. Completion and
/// failure both arrive as messages; a dropped receiver ends the task
/// silently.
pub fn start_load(item_id: String, url: String, sender: Sender<AssetMessage>) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!("no async runtime, splat {item_id} will not be loaded");
        return;
    };

    runtime.spawn(async move {
        info!("loading splat {item_id} from {url}");

        match download(&item_id, &url, &sender).await {
            Ok(bytes) => match SplatCloud::parse(&item_id, &bytes) {
                Ok(cloud) => {
                    debug!("splat {item_id}: {} points", cloud.len());
                    let _ = sender.send(AssetMessage::Loaded { item_id, cloud });
                }
                Err(error) => {
                    let _ = sender.send(AssetMessage::Failed { item_id, error });
                }
            },
            Err(error) => {
                let _ = sender.send(AssetMessage::Failed { item_id, error });
            }
        }
    });
}

async fn download(
    item_id: &str,
    url: &str,
    sender: &Sender<AssetMessage>,
) -> Result<Vec<u8>, ViewerError> {
    let asset_error = |reason: String| ViewerError::AssetLoad {
        item_id: item_id.to_string(),
        reason,
    };

    let mut response = reqwest::get(url)
        .await
        .map_err(|e| asset_error(format!("request to {url} failed: {e}")))?;

    if !response.status().is_success() {
        return Err(asset_error(format!("HTTP {} from {url}", response.status())));
    }

    let total = response.content_length();
    let mut bytes: Vec<u8> = Vec::with_capacity(total.unwrap_or(0) as usize);

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| asset_error(format!("read from {url} failed: {e}")))?
    {
        bytes.extend_from_slice(&chunk);
        let _ = sender.send(AssetMessage::Progress {
            item_id: item_id.to_string(),
            loaded: bytes.len() as u64,
            total,
        });
    }

    Ok(bytes)
}
