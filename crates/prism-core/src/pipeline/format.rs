//! Output format decision.

use std::fmt;

use super::decode::{format_to_string, Canvas};
use crate::trace::Trace;

/// Media type that opts a client into WebP output.
const WEBP_MEDIA_TYPE: &str = "image/webp";

/// Formats the pipeline can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpg,
    Png,
    Webp,
    Gif,
}

impl OutputFormat {
    /// Canonical label, used as the content-type suffix and cached format.
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Gif => "gif",
        }
    }

    /// Parse a label, accepting `jpeg` as an alias of `jpg`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::Webp),
            "gif" => Some(OutputFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the output format for a canvas.
///
/// Order: animated content stays gif, then an explicit `f` directive, then
/// an Accept header advertising WebP, then the origin's own label. Opaque
/// still images always normalize to jpg.
pub fn decide_format(
    canvas: &Canvas,
    requested: &str,
    accept: Option<&str>,
    trace: &Trace,
) -> OutputFormat {
    if canvas.is_animated() {
        if !requested.is_empty() {
            trace.note(format!("format: f={requested} ignored for animated content"));
        }
        return OutputFormat::Gif;
    }

    if !requested.is_empty() {
        match OutputFormat::from_label(requested) {
            Some(format) => {
                trace.note(format!("format: explicit {format}"));
                return format;
            }
            None => {
                tracing::warn!(format = %requested, "Ignoring unsupported output format");
                trace.note(format!("format: unsupported f={requested} ignored"));
            }
        }
    }

    if accept.is_some_and(|value| value.contains(WEBP_MEDIA_TYPE)) {
        trace.note("format: webp via Accept header");
        return OutputFormat::Webp;
    }

    let label = if canvas.label.is_empty() {
        format_to_string(canvas.source_format)
    } else {
        canvas.label.clone()
    };

    let format = if !canvas.has_alpha {
        OutputFormat::Jpg
    } else {
        OutputFormat::from_label(&label).unwrap_or(OutputFormat::Png)
    };
    trace.note(format!("format: {format} from origin label {label}"));
    format
}
