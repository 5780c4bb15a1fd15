//! Validation of fetched origin bodies before they are mirrored.

use crate::config::LimitsConfig;

/// Checks an origin response body before it reaches the mirror.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Validate a fetched body.
    ///
    /// Checks:
    /// - Body is not empty
    /// - Body size is within limits
    /// - Body has valid image magic bytes
    ///
    /// Returns a human-readable reason on rejection.
    pub fn validate(&self, body: &[u8]) -> Result<(), String> {
        if body.is_empty() {
            return Err("empty body".to_string());
        }

        let max_bytes = self.limits.max_file_bytes();
        if body.len() as u64 > max_bytes {
            return Err(format!(
                "body of {} MB exceeds limit of {} MB",
                body.len() as u64 / (1024 * 1024),
                self.limits.max_file_size_mb
            ));
        }

        if !is_valid_image_header(body) {
            return Err("unrecognized image format (invalid magic bytes)".to_string());
        }

        Ok(())
    }
}

/// Check if the leading bytes match a format the decoder handles.
pub fn is_valid_image_header(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }

    // JPEG: FF D8 FF
    if header[..3] == [0xFF, 0xD8, 0xFF] {
        return true;
    }

    // PNG: 89 50 4E 47
    if header[..4] == [0x89, b'P', b'N', b'G'] {
        return true;
    }

    // GIF: GIF8
    if &header[..4] == b"GIF8" {
        return true;
    }

    // WebP: RIFF....WEBP
    if &header[..4] == b"RIFF" {
        return header.len() >= 12 && &header[8..12] == b"WEBP";
    }

    // BMP: BM
    if &header[..2] == b"BM" {
        return true;
    }

    // TIFF: II or MM followed by version 42
    header[..4] == [b'I', b'I', 0x2A, 0x00] || header[..4] == [b'M', b'M', 0x00, 0x2A]
}
