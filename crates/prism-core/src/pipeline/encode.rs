//! Per-format encoder presets, quality mapping, and encoding.

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::decode::Canvas;
use super::format::OutputFormat;
use crate::error::RenderError;

/// JPEG quality used when no `q` directive is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// GIF palette quantization speed (1 = best, 30 = fastest).
const GIF_SPEED: i32 = 10;

/// Compression mode the encoder runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Lossy quality, 1 to 100
    Lossy(u8),
    /// Lossless with a two-digit effort/filter code
    Lossless(u8),
    /// Format has no quality knob
    Fixed,
}

/// Encoder settings for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderPreset {
    pub format: OutputFormat,
    pub compression: Compression,
    png_compression: CompressionType,
    png_filter: FilterType,
}

impl EncoderPreset {
    /// Fixed tuning applied to every render of `format`.
    pub fn for_format(format: OutputFormat) -> Self {
        let compression = match format {
            OutputFormat::Jpg => Compression::Lossy(DEFAULT_JPEG_QUALITY),
            OutputFormat::Png | OutputFormat::Webp => Compression::Lossless(0),
            OutputFormat::Gif => Compression::Fixed,
        };
        Self {
            format,
            compression,
            png_compression: CompressionType::Best,
            png_filter: FilterType::Adaptive,
        }
    }

    /// Map a `q` value onto the format's compression mode.
    ///
    /// Zero leaves the preset untouched. Lossless formats receive the raw
    /// value; for PNG the tens digit selects zlib effort and the units digit
    /// the row filter.
    pub fn with_quality(mut self, quality: u8) -> Self {
        if quality == 0 {
            return self;
        }
        let quality = quality.min(100);
        match self.compression {
            Compression::Lossy(_) => self.compression = Compression::Lossy(quality),
            Compression::Lossless(_) => {
                self.compression = Compression::Lossless(quality);
                if self.format == OutputFormat::Png {
                    self.png_compression = match (quality / 10).min(9) {
                        0..=3 => CompressionType::Fast,
                        4..=6 => CompressionType::Default,
                        _ => CompressionType::Best,
                    };
                    self.png_filter = match quality % 10 {
                        0 => FilterType::NoFilter,
                        1 => FilterType::Sub,
                        2 => FilterType::Up,
                        3 => FilterType::Avg,
                        4 => FilterType::Paeth,
                        _ => FilterType::Adaptive,
                    };
                }
            }
            Compression::Fixed => {}
        }
        self
    }

    /// Encode the canvas. Still formats encode the first frame only.
    pub fn encode(&self, canvas: &Canvas) -> Result<Vec<u8>, RenderError> {
        let first = canvas
            .frames
            .first()
            .ok_or_else(|| self.error("canvas has no frames"))?;
        let (width, height) = first.buffer().dimensions();
        let mut bytes = Vec::new();

        match self.format {
            OutputFormat::Jpg => {
                let quality = match self.compression {
                    Compression::Lossy(q) => q,
                    _ => DEFAULT_JPEG_QUALITY,
                };
                let rgb = DynamicImage::ImageRgba8(first.buffer().clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut bytes, quality)
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| self.error(e))?;
            }
            OutputFormat::Png => {
                let encoder =
                    PngEncoder::new_with_quality(&mut bytes, self.png_compression, self.png_filter);
                write_rgba_or_rgb(encoder, canvas, first.buffer(), width, height)
                    .map_err(|e| self.error(e))?;
            }
            OutputFormat::Webp => {
                let encoder = WebPEncoder::new_lossless(&mut bytes);
                write_rgba_or_rgb(encoder, canvas, first.buffer(), width, height)
                    .map_err(|e| self.error(e))?;
            }
            OutputFormat::Gif => {
                let mut encoder = GifEncoder::new_with_speed(&mut bytes, GIF_SPEED);
                encoder
                    .set_repeat(Repeat::Infinite)
                    .map_err(|e| self.error(e))?;
                encoder
                    .encode_frames(canvas.frames.iter().cloned())
                    .map_err(|e| self.error(e))?;
            }
        }

        Ok(bytes)
    }

    fn error(&self, message: impl ToString) -> RenderError {
        RenderError::Encode {
            format: self.format.label().to_string(),
            message: message.to_string(),
        }
    }
}

/// Write RGBA when the canvas carries transparency, RGB otherwise.
fn write_rgba_or_rgb<E: ImageEncoder>(
    encoder: E,
    canvas: &Canvas,
    buffer: &image::RgbaImage,
    width: u32,
    height: u32,
) -> image::ImageResult<()> {
    if canvas.has_alpha {
        encoder.write_image(buffer.as_raw(), width, height, ExtendedColorType::Rgba8)
    } else {
        let rgb = DynamicImage::ImageRgba8(buffer.clone()).to_rgb8();
        encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
    }
}
