//! Image payloads and upload validation
//!
//! Images travel to the proxy as base64 inside the JSON body. Before that
//! happens each payload is checked against [`ImageRules`]: declared MIME type,
//! decoded size, request-wide count, and the file signature in the first
//! bytes. The signature check catches files whose extension or declared type
//! has been changed without the content matching.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// MIME types the analysis service accepts
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// One image attached to an analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub mime_type: String,

    /// Base64-encoded image bytes (no data-URL prefix)
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes into a payload
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }
}

/// Errors raised while validating or loading images
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid file type for image {index} ({mime_type}). Please use PNG, JPG, or WEBP.")]
    UnsupportedType { index: usize, mime_type: String },

    #[error("Image {index} exceeds maximum size of {:.1}MB", megabytes(.max_bytes))]
    TooLarge { index: usize, max_bytes: usize },

    #[error("Maximum {max} images allowed")]
    TooMany { max: usize },

    #[error("Image {index} is not valid base64 data")]
    Undecodable { index: usize },

    #[error("Image {index} does not appear to be a valid image. Detected signature: {signature}...")]
    UnrecognizedSignature { index: usize, signature: String },

    #[error("Image {index} has mismatched type. Claimed: {declared}, Detected: {detected}")]
    MismatchedType {
        index: usize,
        declared: String,
        detected: &'static str,
    },

    #[error("Unsupported image extension: {}. Please use PNG, JPG, or WEBP.", .path.display())]
    UnknownExtension { path: PathBuf },

    #[error("Failed to read image {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Limits applied to attached images
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRules {
    /// Maximum decoded size of one image in bytes
    #[serde(rename = "max-file-size")]
    pub max_file_size: usize,

    /// Maximum number of images per request
    #[serde(rename = "max-files")]
    pub max_files: usize,

    /// Compare the file signature against the declared type
    #[serde(rename = "verify-signatures")]
    pub verify_signatures: bool,
}

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            max_file_size: 4 * 1024 * 1024,
            max_files: 10,
            verify_signatures: true,
        }
    }
}

impl ImageRules {
    /// Validate every payload of a request
    pub fn validate(&self, images: &[ImagePayload]) -> Result<(), ImageError> {
        debug!(count = images.len(), "ImageRules::validate: called");
        if images.len() > self.max_files {
            debug!("ImageRules::validate: too many images");
            return Err(ImageError::TooMany { max: self.max_files });
        }

        for (i, image) in images.iter().enumerate() {
            self.validate_one(i + 1, image)?;
        }
        Ok(())
    }

    fn validate_one(&self, index: usize, image: &ImagePayload) -> Result<(), ImageError> {
        if !ACCEPTED_MIME_TYPES.contains(&image.mime_type.as_str()) {
            debug!(index, mime_type = %image.mime_type, "ImageRules::validate_one: unsupported type");
            return Err(ImageError::UnsupportedType {
                index,
                mime_type: image.mime_type.clone(),
            });
        }

        let bytes = STANDARD
            .decode(image.data.as_bytes())
            .map_err(|_| ImageError::Undecodable { index })?;

        if bytes.len() > self.max_file_size {
            debug!(index, size = bytes.len(), "ImageRules::validate_one: too large");
            return Err(ImageError::TooLarge {
                index,
                max_bytes: self.max_file_size,
            });
        }

        if self.verify_signatures {
            let detected = detect_mime_type(&bytes).ok_or_else(|| ImageError::UnrecognizedSignature {
                index,
                signature: signature_hex(&bytes),
            })?;

            if detected != image.mime_type {
                debug!(index, declared = %image.mime_type, detected, "ImageRules::validate_one: mismatched type");
                return Err(ImageError::MismatchedType {
                    index,
                    declared: image.mime_type.clone(),
                    detected,
                });
            }
        }

        Ok(())
    }
}

/// Identify an image format from its leading bytes
pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    let header = &bytes[..bytes.len().min(12)];

    if header.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Some("image/png");
    }
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if header.starts_with(b"RIFF") && header.windows(4).any(|w| w == b"WEBP") {
        return Some("image/webp");
    }
    None
}

fn megabytes(bytes: &usize) -> f64 {
    *bytes as f64 / 1024.0 / 1024.0
}

/// First eight bytes as lowercase hex, for error reports
fn signature_hex(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

/// MIME type implied by a file extension
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Read an image file into a payload
pub fn load_image(path: &Path) -> Result<ImagePayload, ImageError> {
    debug!(path = %path.display(), "load_image: called");
    let mime_type = mime_type_for_path(path).ok_or_else(|| ImageError::UnknownExtension {
        path: path.to_path_buf(),
    })?;

    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ImagePayload::from_bytes(mime_type, &bytes))
}
