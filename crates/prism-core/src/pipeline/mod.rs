//! Image transform pipeline.
//!
//! This module contains the stages a render passes through:
//! - **decode**: Decode mirrored bytes into a frame list
//! - **format**: Choose the output format
//! - **geometry**: Crop window and resize arithmetic
//! - **stages**: Animation, crop, resize, normalize and strip
//! - **encode**: Encoder presets, quality mapping and encoding
//! - **validate**: Signature checks on fetched bodies
//! - **hash**: Payload digests for response validators

pub mod decode;
pub mod encode;
pub mod format;
pub mod geometry;
pub mod hash;
pub mod stages;
pub mod validate;

pub use decode::{Canvas, CanvasDecoder};
pub use encode::{Compression, EncoderPreset};
pub use format::OutputFormat;
pub use validate::Validator;

use crate::error::RenderError;
use crate::trace::Trace;
use crate::types::RenderOptions;

/// Result of one pass through the pipeline.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

/// Run every stage in order and encode the result.
///
/// The order is fixed: animation mode, format decision, crop, resize,
/// normalize, encoder presets, quality, strip. CPU-bound; call from a
/// blocking context.
pub fn transform(
    mut canvas: Canvas,
    options: &RenderOptions,
    accept: Option<&str>,
    trace: &Trace,
) -> Result<Encoded, RenderError> {
    stages::apply_animation(&mut canvas, options.animation, trace);

    let format = format::decide_format(&canvas, &options.format, accept, trace);

    stages::crop(&mut canvas, &options.crop, options.center_crop, trace);
    stages::resize(
        &mut canvas,
        options.resize_width,
        options.resize_height,
        trace,
    );
    if options.normalize {
        stages::normalize(&mut canvas, trace);
    }

    let preset = EncoderPreset::for_format(format).with_quality(options.quality);
    trace.note(format!("encode: {format} {:?}", preset.compression));

    stages::strip(&mut canvas, trace);

    let bytes = preset.encode(&canvas)?;
    tracing::debug!(format = %format, bytes = bytes.len(), "Rendered image");
    Ok(Encoded { bytes, format })
}
