//! Core data types shared across the render pipeline.

use bytes::Bytes;
use serde::Deserialize;

/// Animated-content handling requested with the `am` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationMode {
    /// Leave the animation as decoded
    #[default]
    Unset,
    /// Keep only the first frame
    Still,
    /// Reduce to a short preview loop
    Preview,
}

/// A crop rectangle: size plus top-left offset.
///
/// Offsets are signed because a center crop larger than the frame yields a
/// negative origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRect {
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl CropRect {
    /// A crop only takes effect when both dimensions are set.
    pub fn is_active(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Typed option set produced by the directive parser.
///
/// Zero and empty values mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// `rw`
    pub resize_width: u32,
    /// `rh`
    pub resize_height: u32,
    /// `cw`, `ch`, `cx`, `cy`
    pub crop: CropRect,
    /// `cc`: center the crop window, overriding `cx`/`cy`
    pub center_crop: bool,
    /// `q`, 0 to 100
    pub quality: u8,
    /// `f`, lowercase
    pub format: String,
    /// `n`
    pub normalize: bool,
    /// `am`
    pub animation: AnimationMode,
}

impl RenderOptions {
    /// Resize runs when either dimension is given.
    pub fn resize_active(&self) -> bool {
        self.resize_width > 0 || self.resize_height > 0
    }

    /// Replace the caller's crop directive with a pre-authored crop-set.
    pub fn override_crop(&mut self, crop: CropRect) {
        self.crop = crop;
        self.center_crop = false;
    }
}

/// One encoded rendition of a candidate image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "Width", default)]
    pub width: u32,
    #[serde(rename = "Height", default)]
    pub height: u32,
    #[serde(rename = "URI", default)]
    pub uri: String,
    #[serde(rename = "Format", default)]
    pub format: Option<AssetFormat>,
}

/// Encoded format label attached to an asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetFormat {
    #[serde(rename = "TypeName", default)]
    pub type_name: String,
}

/// A pre-authored crop rectangle attached to a candidate image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CropSet {
    #[serde(rename = "CropSizeWidth", default)]
    pub width: u32,
    #[serde(rename = "CropSizeHeight", default)]
    pub height: u32,
    #[serde(rename = "TopLeftX", default)]
    pub x: i32,
    #[serde(rename = "TopLeftY", default)]
    pub y: i32,
}

impl From<CropSet> for CropRect {
    fn from(set: CropSet) -> Self {
        Self {
            width: set.width,
            height: set.height,
            x: set.x,
            y: set.y,
        }
    }
}

/// An image representation of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CandidateImage {
    #[serde(rename = "ImageAssetRefs", default)]
    pub assets: Vec<AssetRef>,
    #[serde(rename = "VirtualImageParams", default)]
    pub crop_sets: Vec<CropSet>,
}

impl CandidateImage {
    /// The rendition used for native dimensions and as the returned URI.
    pub fn primary(&self) -> Option<&AssetRef> {
        self.assets.first()
    }
}

/// Encoded output of one render.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Encoded image bytes
    pub bytes: Bytes,
    /// Format label ("jpg", "png", "webp", "gif")
    pub format: String,
    /// Produced from the placeholder asset rather than the requested one
    pub placeholder: bool,
    /// Served from the result cache
    pub cached: bool,
}

impl Rendered {
    /// Response content type, `image/<label>`.
    pub fn content_type(&self) -> String {
        format!("image/{}", self.format)
    }

    /// Strong entity tag for the payload.
    pub fn etag(&self) -> String {
        format!("\"{}\"", crate::pipeline::hash::content_hash(&self.bytes))
    }
}
