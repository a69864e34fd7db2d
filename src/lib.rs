pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod geopoint;
pub mod resort;
pub mod storage;
pub mod variant;
pub mod webcam;

pub use client::StationsClient;
pub use error::{StationError, UploadStage};
pub use geopoint::GeoPoint;
pub use resort::Resort;
pub use webcam::{rank_by_proximity, RankedWebcam, WebcamCandidate};

// Re-export the variant pipeline types consumed alongside the client.
pub use variant::{UploadRequest, VariantFormat, VariantOptions, VariantPair};
