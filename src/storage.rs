// src/storage.rs

use crate::client::StationsClient;
use crate::error::StationError;

use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Request body for the storage credential issuer.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub filename: String,
}

/// A write credential issued by the storage service: a pre-signed target to
/// PUT the bytes to, and the public URL the object will be served from.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PresignedUpload {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
    #[serde(rename = "publicUrl")]
    pub public_url: String,
}

impl StationsClient {
    /// Requests a write credential for `filename` from the storage credential
    /// issuer (`POST {api}/api/s3/presign`).
    ///
    /// Filenames are deterministic object keys: presigning the same filename
    /// again yields a credential for the same object, so retried uploads
    /// overwrite rather than duplicate.
    pub async fn presign_upload(&self, filename: &str) -> Result<PresignedUpload, StationError> {
        if filename.is_empty() {
            return Err(StationError::InvalidInput(
                "filename cannot be empty for presign_upload".to_string(),
            ));
        }
        let body = PresignRequest {
            filename: filename.to_string(),
        };
        self.post("api/s3/presign", &body).await
    }

    /// Transfers raw bytes to a pre-signed write target with a plain PUT.
    ///
    /// Any non-success status is surfaced as an error; the caller decides
    /// which pipeline stage it belongs to.
    pub async fn transfer_to(
        &self,
        upload_url: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<(), StationError> {
        let url = Url::parse(upload_url)?;

        log::debug!(
            "Transferring {} bytes ({}) to {}",
            data.len(),
            mime_type,
            url.as_str()
        );

        let response = self
            .http_client
            .put(url)
            .header(CONTENT_TYPE, mime_type)
            .body(data)
            .send()
            .await
            .map_err(StationError::ReqwestError)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StationError::ApiError {
                status: status.as_u16(),
                message: format!("binary transfer rejected: {}", body),
            })
        }
    }

    /// Uploads one object through the presign handshake and returns its
    /// public URL. This is the single-image flow (cover images, logos);
    /// the variant pipeline composes the same two steps per variant.
    pub async fn upload_via_presign(
        &self,
        filename: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<String, StationError> {
        let presigned = self.presign_upload(filename).await?;
        self.transfer_to(&presigned.upload_url, mime_type, data)
            .await?;
        Ok(presigned.public_url)
    }
}
