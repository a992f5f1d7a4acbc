use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::{MediaAsset, MediaError, MediaUploader, UploadOptions};

/// In-memory uploader for tests: records every upload and delete, and can be
/// switched into a failing mode to exercise the unavailable paths.
#[derive(Default)]
pub struct MemoryUploader {
    uploads: Mutex<Vec<StoredUpload>>,
    deleted: Mutex<Vec<String>>,
    fail: AtomicBool,
}

pub struct StoredUpload {
    pub asset: MediaAsset,
    pub bytes: Bytes,
    pub opts: UploadOptions,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn uploaded_urls(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.asset.url.clone())
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaUploader for MemoryUploader {
    async fn upload(&self, bytes: Bytes, opts: UploadOptions) -> Result<MediaAsset, MediaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Unavailable("forced failure".into()));
        }

        let public_id = match &opts.folder {
            Some(folder) => format!("{}/{}", folder, Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let asset = MediaAsset {
            url: format!("https://media.test/{public_id}"),
            public_id: public_id.clone(),
        };
        self.uploads.lock().unwrap().push(StoredUpload {
            asset: asset.clone(),
            bytes,
            opts,
        });
        Ok(asset)
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MediaError::Unavailable("forced failure".into()));
        }
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_uploads_and_deletes() {
        let uploader = MemoryUploader::new();
        let asset = uploader
            .upload(Bytes::from_static(b"img"), UploadOptions::folder("articles/u1"))
            .await
            .unwrap();
        assert!(asset.url.starts_with("https://media.test/articles/u1/"));
        assert_eq!(uploader.upload_count(), 1);

        uploader.delete(&asset.public_id).await.unwrap();
        assert_eq!(uploader.deleted_ids(), vec![asset.public_id]);
    }

    #[tokio::test]
    async fn failing_mode_surfaces_unavailable() {
        let uploader = MemoryUploader::new();
        uploader.set_failing(true);
        let result = uploader
            .upload(Bytes::from_static(b"img"), UploadOptions::default())
            .await;
        assert!(matches!(result, Err(MediaError::Unavailable(_))));
    }
}
