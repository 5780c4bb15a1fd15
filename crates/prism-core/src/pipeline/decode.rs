//! Image decoding into a frame list with format detection and limits.

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, Frame, ImageDecoder, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::LimitsConfig;
use crate::error::RenderError;

/// A decoded image ready for the transform pipeline.
///
/// Every frame is an 8-bit RGBA buffer positioned at the frame origin.
/// Animated GIFs are composited on decode, so each frame is a full canvas.
pub struct Canvas {
    pub frames: Vec<Frame>,
    /// Format detected from the bytes
    pub source_format: ImageFormat,
    /// Lowercase file extension of the mirror path ("jpg", "png", ...)
    pub label: String,
    /// Whether the source carries transparency
    pub has_alpha: bool,
    /// Embedded ICC profile, dropped by the strip stage
    pub icc_profile: Option<Vec<u8>>,
}

impl Canvas {
    /// Build a single-frame canvas from an in-memory image.
    pub fn from_image(image: DynamicImage, source_format: ImageFormat, label: &str) -> Self {
        let has_alpha = image.color().has_alpha();
        Self {
            frames: vec![Frame::new(image.to_rgba8())],
            source_format,
            label: label.to_string(),
            has_alpha,
            icc_profile: None,
        }
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Dimensions of the first frame.
    pub fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|frame| frame.buffer().dimensions())
            .unwrap_or((0, 0))
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("Canvas")
            .field("frames", &self.frames.len())
            .field("width", &width)
            .field("height", &height)
            .field("source_format", &self.source_format)
            .field("label", &self.label)
            .field("has_alpha", &self.has_alpha)
            .finish()
    }
}

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct CanvasDecoder {
    limits: LimitsConfig,
}

impl CanvasDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode on the blocking pool.
    pub async fn decode(&self, bytes: Vec<u8>, path: &Path) -> Result<Canvas, RenderError> {
        let decoder = self.clone();
        let path_owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || decoder.decode_sync(&bytes, &path_owned))
            .await
            .map_err(|e| RenderError::Worker(format!("decode task: {e}")))?
    }

    /// Decode `bytes`, labelling the canvas by the extension of `path`.
    pub fn decode_sync(&self, bytes: &[u8], path: &Path) -> Result<Canvas, RenderError> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_error(path, format!("Cannot detect image format: {e}")))?;
        let format = match reader.format() {
            Some(f) => f,
            None => {
                let f = ImageFormat::from_path(path)
                    .map_err(|_| decode_error(path, "Unrecognized image format".to_string()))?;
                reader.set_format(f);
                f
            }
        };
        let label = extension_label(path);

        let canvas = if format == ImageFormat::Gif {
            Self::decode_gif(bytes, path, label)?
        } else {
            let mut decoder = reader
                .into_decoder()
                .map_err(|e| decode_error(path, e.to_string()))?;
            let icc_profile = decoder.icc_profile().ok().flatten();
            self.check_dimensions(decoder.dimensions(), path)?;
            let image =
                DynamicImage::from_decoder(decoder).map_err(|e| decode_error(path, e.to_string()))?;
            let mut canvas = Canvas::from_image(image, format, &label);
            canvas.icc_profile = icc_profile;
            canvas
        };

        self.check_dimensions(canvas.dimensions(), path)?;
        Ok(canvas)
    }

    fn decode_gif(bytes: &[u8], path: &Path, label: String) -> Result<Canvas, RenderError> {
        let decoder =
            GifDecoder::new(Cursor::new(bytes)).map_err(|e| decode_error(path, e.to_string()))?;
        let frames = decoder
            .into_frames()
            .collect_frames()
            .map_err(|e| decode_error(path, e.to_string()))?;
        if frames.is_empty() {
            return Err(decode_error(path, "GIF has no frames".to_string()));
        }
        let has_alpha = frames
            .iter()
            .any(|frame| frame.buffer().pixels().any(|p| p[3] < u8::MAX));
        Ok(Canvas {
            frames,
            source_format: ImageFormat::Gif,
            label,
            has_alpha,
            icc_profile: None,
        })
    }

    fn check_dimensions(&self, (width, height): (u32, u32), path: &Path) -> Result<(), RenderError> {
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(RenderError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }
}

fn decode_error(path: &Path, message: String) -> RenderError {
    RenderError::Decode {
        path: PathBuf::from(path),
        message,
    }
}

/// Lowercase extension of `path`, or an empty string.
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        _ => "unknown".to_string(),
    }
}
