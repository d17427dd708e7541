pub mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{
    CameraPose, GlobalMetadata, LinkedScene, Metadata, SceneDocument, SceneItem, View, ViewGroup,
    ViewGroupMetadata, ViewMetadata,
};
