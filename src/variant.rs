// src/variant.rs

use crate::client::StationsClient;
use crate::error::{StationError, UploadStage};

use image::imageops::{self, FilterType};
use image::{GenericImageView, ImageOutputFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// A source image selected for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Object key on the content store; also the seed for the derived
    /// small-variant filename.
    pub filename: String,
    /// MIME type of the unmodified source (e.g. "image/png").
    pub mime_type: String,
    /// Raw bytes of the source image.
    pub data: Vec<u8>,
}

impl UploadRequest {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        UploadRequest {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Encoding of the small variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantFormat {
    Jpeg,
    Png,
}

impl VariantFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            VariantFormat::Jpeg => "image/jpeg",
            VariantFormat::Png => "image/png",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            VariantFormat::Jpeg => "jpg",
            VariantFormat::Png => "png",
        }
    }
}

/// Tuning knobs for the small variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantOptions {
    /// Width cap for the small variant. Narrower sources are never upscaled.
    pub target_small_width: u32,
    pub format: VariantFormat,
    /// Encoder quality in (0, 1]. Ignored for PNG output.
    pub quality: f32,
}

impl Default for VariantOptions {
    fn default() -> Self {
        VariantOptions {
            target_small_width: 800,
            format: VariantFormat::Jpeg,
            quality: 0.85,
        }
    }
}

/// Public URLs of the two stored variants.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VariantPair {
    #[serde(rename = "largeUrl")]
    pub large_url: String,
    #[serde(rename = "smallUrl")]
    pub small_url: String,
}

/// Derives the small-variant filename by inserting `-small` before the
/// extension. The extension is forced to match the output encoding, so the
/// stored object never lies about its content type:
/// `"plan-pistes.PNG"` with JPEG output becomes `"plan-pistes-small.jpg"`.
pub fn small_variant_filename(original: &str, format: VariantFormat) -> String {
    let base = match original.rfind('.') {
        Some(i) if i > 0 => &original[..i],
        _ => original,
    };
    format!("{}-small.{}", base, format.extension())
}

/// Decodes `data`, scales it down to at most `target_width` wide (preserving
/// aspect ratio, never upscaling) and re-encodes it.
///
/// JPEG output is composited over opaque white first: JPEG has no alpha
/// channel, and without the fill a transparent source would come out with an
/// undefined dark background.
///
/// # Errors
///
/// [`StationError::InvalidImage`] when the source cannot be decoded or has a
/// zero dimension; [`StationError::InvalidInput`] when `quality` is outside
/// (0, 1] or `target_width` is zero.
pub fn resize_to_width(
    data: &[u8],
    target_width: u32,
    format: VariantFormat,
    quality: f32,
) -> Result<Vec<u8>, StationError> {
    if target_width == 0 {
        return Err(StationError::InvalidInput(
            "target_width must be at least 1".to_string(),
        ));
    }
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(StationError::InvalidInput(format!(
            "quality must be in (0, 1], got {quality}"
        )));
    }

    let img = image::load_from_memory(data)
        .map_err(|e| StationError::InvalidImage(format!("undecodable source image: {e}")))?;

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(StationError::InvalidImage(format!(
            "source image has a zero dimension ({w}x{h})"
        )));
    }

    let out_w = target_width.min(w);
    let out_h = (((out_w as f64) * (h as f64) / (w as f64)).round() as u32).max(1);

    let resized = imageops::resize(&img.to_rgba8(), out_w, out_h, FilterType::Lanczos3);

    let mut buf = Cursor::new(Vec::new());
    match format {
        VariantFormat::Jpeg => {
            // Flatten onto opaque white before dropping the alpha channel.
            let mut flat = RgbImage::new(out_w, out_h);
            for (x, y, px) in resized.enumerate_pixels() {
                let [r, g, b, a] = px.0;
                let alpha = a as f32 / 255.0;
                let blend = |c: u8| ((c as f32) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
                flat.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
            }
            let q = ((quality * 100.0).round() as u8).clamp(1, 100);
            image::DynamicImage::ImageRgb8(flat)
                .write_to(&mut buf, ImageOutputFormat::Jpeg(q))
                .map_err(|e| StationError::InvalidImage(format!("JPEG encoding failed: {e}")))?;
        }
        VariantFormat::Png => {
            image::DynamicImage::ImageRgba8(resized)
                .write_to(&mut buf, ImageOutputFormat::Png)
                .map_err(|e| StationError::InvalidImage(format!("PNG encoding failed: {e}")))?;
        }
    }

    Ok(buf.into_inner())
}

impl StationsClient {
    /// Uploads a source image and a width-capped small variant of it, each
    /// through its own presign + transfer handshake, and returns both public
    /// URLs.
    ///
    /// The pipeline is linear: large upload, then resize, then small upload.
    /// There is no retry and no atomicity between the two objects; a failure
    /// after the large transfer leaves the large variant persisted on its
    /// own. Filenames are deterministic, so retrying the whole call simply
    /// overwrites both objects.
    ///
    /// # Errors
    ///
    /// Upload failures carry the stage they happened in
    /// ([`UploadStage`]: `presign-large`, `transfer-large`, `presign-small`,
    /// `transfer-small`); resize failures keep their own
    /// [`StationError::InvalidImage`] / [`StationError::InvalidInput`] types.
    pub async fn create_variant_pair(
        &self,
        source: UploadRequest,
        opts: &VariantOptions,
    ) -> Result<VariantPair, StationError> {
        // Uploading-Large
        let presigned_large = self
            .presign_upload(&source.filename)
            .await
            .map_err(|e| StationError::upload(UploadStage::PresignLarge, e))?;
        self.transfer_to(
            &presigned_large.upload_url,
            &source.mime_type,
            source.data.clone(),
        )
        .await
        .map_err(|e| StationError::upload(UploadStage::TransferLarge, e))?;

        // Resizing
        let small_data = resize_to_width(
            &source.data,
            opts.target_small_width,
            opts.format,
            opts.quality,
        )?;

        // Uploading-Small
        let small_filename = small_variant_filename(&source.filename, opts.format);
        let presigned_small = self
            .presign_upload(&small_filename)
            .await
            .map_err(|e| StationError::upload(UploadStage::PresignSmall, e))?;
        self.transfer_to(
            &presigned_small.upload_url,
            opts.format.mime_type(),
            small_data,
        )
        .await
        .map_err(|e| StationError::upload(UploadStage::TransferSmall, e))?;

        Ok(VariantPair {
            large_url: presigned_large.public_url,
            small_url: presigned_small.public_url,
        })
    }
}
