//! Object-storage collaborator behind a trait so handlers never hold a
//! concrete dependency on the storage provider.

mod http;
mod memory;

pub use http::HttpMediaUploader;
pub use memory::MemoryUploader;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// A stored asset: the public URL plus the provider's identifier, which is
/// what `delete` takes.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub folder: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl UploadOptions {
    pub fn folder(folder: impl Into<String>) -> Self {
        Self {
            folder: Some(folder.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    /// Transient failure that survived the retry budget.
    #[error("media storage unavailable: {0}")]
    Unavailable(String),
    /// The provider answered but refused the request.
    #[error("media storage rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, bytes: Bytes, opts: UploadOptions) -> Result<MediaAsset, MediaError>;

    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}
