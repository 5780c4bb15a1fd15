//! Directive parsing: `name=value` tokens separated by `:`.
//!
//! Parsing never fails as a whole. A token without exactly one `=` is
//! skipped, an unknown name is logged, and a malformed value leaves only
//! that field at its default.

use crate::trace::Trace;
use crate::types::{AnimationMode, RenderOptions};

/// Parse a directive segment such as `rw=480:rh=320:q=50`.
pub fn parse_directives(segment: &str, identifier: &str, trace: &Trace) -> RenderOptions {
    let mut options = RenderOptions::default();

    for token in segment.split(':') {
        let mut parts = token.split('=');
        let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        match name {
            "rw" => options.resize_width = parse_uint(value),
            "rh" => options.resize_height = parse_uint(value),
            "cw" => options.crop.width = parse_uint(value),
            "ch" => options.crop.height = parse_uint(value),
            "cx" => {
                if let Ok(x) = value.parse() {
                    options.crop.x = x;
                }
            }
            "cy" => {
                if let Ok(y) = value.parse() {
                    options.crop.y = y;
                }
            }
            "cc" => options.center_crop = value == "1",
            "q" => options.quality = parse_quality(value),
            "f" => options.format = value.to_ascii_lowercase(),
            "n" => options.normalize = value == "1",
            "am" => options.animation = parse_animation(value),
            _ => {
                tracing::warn!(directive = name, identifier, "Unknown directive");
                trace.note(format!("unknown directive {name}={value} for {identifier}"));
                continue;
            }
        }
        trace.note(format!("directive {name}={value}"));
    }

    options
}

/// Unsigned parse; anything unparsable becomes 0 (unset).
pub fn parse_uint(value: &str) -> u32 {
    match value.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            tracing::debug!(value, "Failed to convert number");
            0
        }
    }
}

/// Parse a quality value.
///
/// Integers are taken as-is (capped at 100). Values below 1 are a fraction
/// of 100, so `0.5` is 50. The literal `1` is quality 1, not 100%.
pub fn parse_quality(value: &str) -> u8 {
    if let Ok(n) = value.parse::<u32>() {
        return n.min(100) as u8;
    }
    match value.parse::<f64>() {
        Ok(fraction) if fraction > 0.0 && fraction < 1.0 => (fraction * 100.0).round() as u8,
        Ok(n) if (1.0..=100.0).contains(&n) => n.floor() as u8,
        Ok(n) if n > 100.0 => 100,
        _ => {
            tracing::debug!(value, "Failed to convert quality");
            0
        }
    }
}

fn parse_animation(value: &str) -> AnimationMode {
    match value {
        "s" | "still" => AnimationMode::Still,
        "p" | "preview" => AnimationMode::Preview,
        other => {
            tracing::debug!(value = other, "Unknown animation mode");
            AnimationMode::Unset
        }
    }
}
