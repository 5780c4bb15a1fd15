//! Decoding of metadata documents into candidate images.

use serde::Deserialize;

use crate::types::CandidateImage;

/// Query response envelope: `{"response": {"docs": [...]}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(alias = "Response")]
    pub response: DocList,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocList {
    #[serde(alias = "Docs", default)]
    pub docs: Vec<serde_json::Value>,
}

/// A content item. When the item is itself an image its asset references
/// sit at the top level; otherwise it lists captioned and plain images.
#[derive(Debug, Default, Deserialize)]
struct Item {
    #[serde(flatten)]
    image: CandidateImage,
    #[serde(rename = "ImagesWithCaptions", default)]
    captioned: Vec<Captioned>,
    #[serde(rename = "Images", default)]
    images: Vec<CandidateImage>,
}

#[derive(Debug, Default, Deserialize)]
struct Captioned {
    #[serde(rename = "Image", default)]
    image: CandidateImage,
}

/// Candidate images of a descriptor, in selection order.
///
/// A descriptor that is directly an image yields itself. Otherwise
/// captioned images come first, then plain images, each in source order.
/// Candidates without any asset reference are dropped.
pub fn candidates(descriptor: &serde_json::Value) -> Vec<CandidateImage> {
    let item = match Item::deserialize(descriptor) {
        Ok(item) => item,
        Err(e) => {
            tracing::warn!("Cannot decode metadata descriptor: {e}");
            return Vec::new();
        }
    };

    if !item.image.assets.is_empty() {
        return vec![item.image];
    }

    item.captioned
        .into_iter()
        .map(|c| c.image)
        .chain(item.images)
        .filter(|candidate| !candidate.assets.is_empty())
        .collect()
}
