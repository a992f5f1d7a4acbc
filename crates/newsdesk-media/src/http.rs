use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::{MediaAsset, MediaError, MediaUploader, UploadOptions};

/// HTTP client for the object-storage service. Every call carries an explicit
/// timeout; transient failures get exactly one retry before the caller sees
/// [`MediaError::Unavailable`].
pub struct HttpMediaUploader {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: String,
}

impl HttpMediaUploader {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn form(
        &self,
        bytes: &Bytes,
        opts: &UploadOptions,
    ) -> Result<reqwest::multipart::Form, UploadFailure> {
        let mut part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(opts.filename.clone().unwrap_or_else(|| "upload".into()));
        if let Some(ct) = &opts.content_type {
            part = part
                .mime_str(ct)
                .map_err(|e| UploadFailure::Permanent(format!("invalid content type: {e}")))?;
        }

        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(folder) = &opts.folder {
            form = form.text("folder", folder.clone());
        }
        Ok(form)
    }

    async fn try_upload(&self, bytes: &Bytes, opts: &UploadOptions) -> Result<MediaAsset, UploadFailure> {
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(self.form(bytes, opts)?)
            .send()
            .await
            .map_err(UploadFailure::from_reqwest)?;

        if !response.status().is_success() {
            return Err(UploadFailure::Permanent(format!(
                "upload returned {}",
                response.status()
            )));
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|e| UploadFailure::Permanent(format!("bad upload reply: {e}")))?;

        let url = reply
            .secure_url
            .or(reply.url)
            .ok_or_else(|| UploadFailure::Permanent("upload reply missing url".into()))?;

        Ok(MediaAsset {
            url,
            public_id: reply.public_id,
        })
    }
}

enum UploadFailure {
    /// Timeout or connect error, worth one retry.
    Transient(String),
    Permanent(String),
}

impl UploadFailure {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Self::Transient(e.to_string())
        } else {
            Self::Permanent(e.to_string())
        }
    }
}

#[async_trait]
impl MediaUploader for HttpMediaUploader {
    async fn upload(&self, bytes: Bytes, opts: UploadOptions) -> Result<MediaAsset, MediaError> {
        match self.try_upload(&bytes, &opts).await {
            Ok(asset) => Ok(asset),
            Err(UploadFailure::Permanent(msg)) => Err(MediaError::Rejected(msg)),
            Err(UploadFailure::Transient(msg)) => {
                warn!("media upload failed ({}), retrying once", msg);
                match self.try_upload(&bytes, &opts).await {
                    Ok(asset) => Ok(asset),
                    Err(UploadFailure::Permanent(msg)) => Err(MediaError::Rejected(msg)),
                    Err(UploadFailure::Transient(msg)) => Err(MediaError::Unavailable(msg)),
                }
            }
        }
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, public_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    MediaError::Unavailable(e.to_string())
                } else {
                    MediaError::Rejected(e.to_string())
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(MediaError::Rejected(format!(
                "delete returned {}",
                response.status()
            )))
        }
    }
}
