// src/error.rs

use reqwest::header::InvalidHeaderValue;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Identifies which step of the variant pipeline an upload failure occurred in.
///
/// The two-phase handshake (credential issuance, then binary transfer) runs
/// once for the large variant and once for the small one, so four distinct
/// stages can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    PresignLarge,
    TransferLarge,
    PresignSmall,
    TransferSmall,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::PresignLarge => "presign-large",
            UploadStage::TransferLarge => "transfer-large",
            UploadStage::PresignSmall => "presign-small",
            UploadStage::TransferSmall => "transfer-small",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StationError {
    #[error("HTTP request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parsing failed: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonDeserializationFailed(String),

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid reference coordinates: {0}")]
    InvalidReference(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Upload failed at stage '{stage}': {message}")]
    Upload { stage: UploadStage, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(InvalidHeaderValue),

    #[error("SDK error: {0}")]
    SdkError(String),
}

impl StationError {
    /// Tags any lower-level failure with the pipeline stage it occurred in.
    pub(crate) fn upload(stage: UploadStage, source: impl fmt::Display) -> Self {
        StationError::Upload {
            stage,
            message: source.to_string(),
        }
    }

    /// Creates a `StationError` from an HTTP status code and a JSON response body.
    pub(crate) fn from_response(status_code: u16, response_body: Value) -> Self {
        let message = response_body
            .get("error")
            .and_then(|v| v.as_str())
            .or_else(|| response_body.get("detail").and_then(|v| v.as_str()))
            .unwrap_or("Unknown error")
            .to_string();

        StationError::ApiError {
            status: status_code,
            message,
        }
    }
}
