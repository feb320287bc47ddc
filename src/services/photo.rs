// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plant photo handling: upload normalization and the stock image whitelist.
//!
//! Uploads are identified by content sniffing, never by the client-supplied
//! filename or content type. Accepted images are downscaled and re-encoded
//! as JPEG so that every stored upload has the same format.

use crate::error::AppError;
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageError, ImageFormat,
    ImageReader, Limits,
};
use std::io::Cursor;

/// Largest accepted upload, before normalization.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Longest side of a stored photo.
pub const MAX_STORED_DIMENSION: u32 = 1024;

/// Decoder guard against decompression bombs.
const MAX_DECODE_DIMENSION: u32 = 8000;

const JPEG_QUALITY: u8 = 85;

pub const STORED_MIME: &str = "image/jpeg";

/// A photo after validation and normalization, ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPhoto {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

/// Validate an uploaded photo and normalize it to a bounded-size JPEG.
pub fn normalize_upload(bytes: &[u8]) -> Result<NormalizedPhoto, AppError> {
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(AppError::ImageTooLarge);
    }

    let format = detect_format(bytes).ok_or(AppError::UnsupportedImage)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);

    let mut reader = ImageReader::with_format(Cursor::new(bytes), format);
    reader.limits(limits);
    let img = reader.decode().map_err(|e| match e {
        ImageError::Limits(_) => AppError::ImageTooLarge,
        other => {
            tracing::debug!(error = %other, "Failed to decode uploaded photo");
            AppError::UnsupportedImage
        }
    })?;

    encode_jpeg(downscale(img))
}

/// Sniff the image format from its leading bytes, keeping only the formats
/// we accept.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes).ok()? {
        f @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Gif) => {
            Some(f)
        }
        _ => None,
    }
}

/// MIME type for raw stored bytes whose type was never recorded.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    detect_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

fn downscale(img: DynamicImage) -> DynamicImage {
    if img.width() <= MAX_STORED_DIMENSION && img.height() <= MAX_STORED_DIMENSION {
        return img;
    }
    img.resize(MAX_STORED_DIMENSION, MAX_STORED_DIMENSION, FilterType::Lanczos3)
}

fn encode_jpeg(img: DynamicImage) -> Result<NormalizedPhoto, AppError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JPEG encoding failed: {}", e)))?;

    Ok(NormalizedPhoto {
        bytes,
        mime: STORED_MIME.to_string(),
        width,
        height,
    })
}

// ─── Stock images ────────────────────────────────────────────

/// A bundled illustration users can pick instead of uploading a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockImage {
    pub key: &'static str,
    pub label: &'static str,
    /// Path relative to the static directory, also stored in `photo_path`.
    pub path: &'static str,
}

pub const STOCK_IMAGES: &[StockImage] = &[
    StockImage {
        key: "monstera",
        label: "Monstera",
        path: "stock/monstera.svg",
    },
    StockImage {
        key: "fern",
        label: "Fern",
        path: "stock/fern.svg",
    },
    StockImage {
        key: "cactus",
        label: "Cactus",
        path: "stock/cactus.svg",
    },
    StockImage {
        key: "succulent",
        label: "Succulent",
        path: "stock/succulent.svg",
    },
    StockImage {
        key: "snake_plant",
        label: "Snake plant",
        path: "stock/snake-plant.svg",
    },
    StockImage {
        key: "pothos",
        label: "Pothos",
        path: "stock/pothos.svg",
    },
];

impl StockImage {
    /// Look up a whitelisted stock image by its form key.
    pub fn by_key(key: &str) -> Option<&'static StockImage> {
        STOCK_IMAGES.iter().find(|s| s.key == key)
    }

    /// Look up a whitelisted stock image by its stored path.
    pub fn by_path(path: &str) -> Option<&'static StockImage> {
        STOCK_IMAGES.iter().find(|s| s.path == path)
    }

    /// URL the image is served from.
    pub fn url(&self) -> String {
        format!("/static/{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let buf = ImageBuffer::from_pixel(width, height, Rgba([30u8, 140, 60, 200]));
        encode(DynamicImage::ImageRgba8(buf), ImageFormat::Png)
    }

    #[test]
    fn test_normalize_small_png_to_jpeg() {
        let photo = normalize_upload(&png(40, 30)).unwrap();
        assert_eq!(photo.mime, "image/jpeg");
        assert_eq!((photo.width, photo.height), (40, 30));
        assert_eq!(detect_format(&photo.bytes), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_normalize_downscales_keeping_aspect() {
        let photo = normalize_upload(&png(2048, 512)).unwrap();
        assert_eq!((photo.width, photo.height), (1024, 256));
    }

    #[test]
    fn test_rejects_non_image_payload() {
        let err = normalize_upload(b"#!/bin/sh\necho not a photo\n").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedImage));
    }

    #[test]
    fn test_rejects_truncated_image() {
        let mut bytes = png(64, 64);
        bytes.truncate(40);
        let err = normalize_upload(&bytes).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedImage));
    }

    #[test]
    fn test_rejects_oversized_upload_before_decoding() {
        let mut bytes = png(8, 8);
        bytes.resize(MAX_PHOTO_BYTES + 1, 0);
        let err = normalize_upload(&bytes).unwrap_err();
        assert!(matches!(err, AppError::ImageTooLarge));
    }

    #[test]
    fn test_rejects_unaccepted_format() {
        // BMP and TIFF headers are recognized but not accepted
        assert_eq!(detect_format(b"BM\x3e\x00\x00\x00\x00\x00"), None);
        assert_eq!(detect_format(b"II*\x00\x08\x00\x00\x00"), None);
        let err = normalize_upload(b"BM\x3e\x00\x00\x00\x00\x00").unwrap_err();
        assert!(matches!(err, AppError::UnsupportedImage));
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&png(2, 2)), "image/png");
        assert_eq!(sniff_mime(b"plain text"), "application/octet-stream");
    }

    #[test]
    fn test_stock_whitelist_lookup() {
        let fern = StockImage::by_key("fern").unwrap();
        assert_eq!(fern.url(), "/static/stock/fern.svg");
        assert_eq!(StockImage::by_path(fern.path), Some(fern));
        assert_eq!(StockImage::by_key("../etc/passwd"), None);
        assert_eq!(StockImage::by_key("Fern"), None);
    }
}
