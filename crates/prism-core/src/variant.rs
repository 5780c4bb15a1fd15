//! Best-variant selection for content-item identifiers.
//!
//! A content item can carry several candidate images, each with optional
//! crop-sets authored for particular aspect ratios. Selection flattens them
//! into scored entries and runs three ordered preference rules over the
//! list, keeping a running best.

use crate::metadata::{candidates, MetadataClient};
use crate::trace::Trace;
use crate::types::{CandidateImage, CropRect};

/// Parsed `mgid:<provider>:<kind>:<namespace>:<id>` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentId<'a> {
    pub provider: &'a str,
    pub namespace: &'a str,
    pub id: &'a str,
}

impl<'a> ContentId<'a> {
    /// Split an identifier into its five segments.
    pub fn parse(identifier: &'a str) -> Option<Self> {
        let segments: Vec<&str> = identifier.split(':').collect();
        match segments[..] {
            ["mgid", provider, _kind, namespace, id]
                if !namespace.is_empty() && !id.is_empty() =>
            {
                Some(Self {
                    provider,
                    namespace,
                    id,
                })
            }
            _ => None,
        }
    }
}

/// The chosen asset and the crop to apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub uri: String,
    /// Zero when the winner is a candidate's native dimensions
    pub crop: CropRect,
}

/// One flattened selection entry.
#[derive(Debug, Clone)]
struct Scored<'a> {
    /// `floor(w / h * 10)`, `None` for a zero height
    ratio: Option<u64>,
    width_diff: u64,
    height_diff: u64,
    uri: &'a str,
    crop: CropRect,
}

impl<'a> Scored<'a> {
    fn new(target: (u32, u32), size: (u32, u32), uri: &'a str, crop: CropRect) -> Self {
        Self {
            ratio: ratio_tenths(size.0, size.1),
            width_diff: u64::from(target.0.abs_diff(size.0)),
            height_diff: u64::from(target.1.abs_diff(size.1)),
            uri,
            crop,
        }
    }

    /// Whether `self` should replace `best` for `target`.
    fn beats(&self, best: &Scored<'_>, target: u64) -> bool {
        let matches = self.ratio == Some(target);
        let best_matches = best.ratio == Some(target);
        let closer_on_either =
            self.width_diff < best.width_diff || self.height_diff < best.height_diff;
        let closer_on_both =
            self.width_diff < best.width_diff && self.height_diff < best.height_diff;

        (matches && closer_on_either) || (matches && !best_matches) || (!best_matches && closer_on_both)
    }
}

/// Aspect ratio in tenths, truncated.
fn ratio_tenths(width: u32, height: u32) -> Option<u64> {
    (height > 0).then(|| u64::from(width) * 10 / u64::from(height))
}

fn flatten(candidates: &[CandidateImage], target: (u32, u32)) -> Vec<Scored<'_>> {
    let mut entries = Vec::new();
    for candidate in candidates {
        let Some(asset) = candidate.primary() else {
            continue;
        };
        if candidate.crop_sets.is_empty() {
            entries.push(Scored::new(
                target,
                (asset.width, asset.height),
                &asset.uri,
                CropRect::default(),
            ));
        }
        for set in &candidate.crop_sets {
            entries.push(Scored::new(
                target,
                (set.width, set.height),
                &asset.uri,
                (*set).into(),
            ));
        }
    }
    entries
}

/// Pick the candidate that best fits `width` x `height`.
///
/// A zero target dimension skips matching and returns the first candidate
/// uncropped. Deterministic for a fixed candidate list.
pub fn select_variant(candidates: &[CandidateImage], width: u32, height: u32) -> Option<Variant> {
    if width == 0 || height == 0 {
        return candidates.iter().find_map(|c| c.primary()).map(|asset| Variant {
            uri: asset.uri.clone(),
            crop: CropRect::default(),
        });
    }

    let target = u64::from(width) * 10 / u64::from(height);
    let mut entries = flatten(candidates, (width, height)).into_iter();
    let mut best = entries.next()?;
    for entry in entries {
        if entry.beats(&best, target) {
            best = entry;
        }
    }

    Some(Variant {
        uri: best.uri.to_string(),
        crop: best.crop,
    })
}

/// Resolves identifiers through the metadata service.
pub struct VariantResolver {
    client: MetadataClient,
    provider: String,
}

impl VariantResolver {
    pub fn new(client: MetadataClient, provider: &str) -> Self {
        Self {
            client,
            provider: provider.to_string(),
        }
    }

    /// Resolve an identifier to an asset URI and crop.
    ///
    /// `None` for malformed identifiers, foreign providers, lookup failures,
    /// and items without images. Callers fall back to the placeholder.
    pub async fn resolve(
        &self,
        identifier: &str,
        width: u32,
        height: u32,
        refresh: bool,
        trace: &Trace,
    ) -> Option<Variant> {
        let Some(content) = ContentId::parse(identifier) else {
            tracing::warn!(identifier = %identifier, "Malformed content identifier");
            trace.note(format!("variant: malformed identifier {identifier}"));
            return None;
        };
        if content.provider != self.provider {
            tracing::warn!(provider = %content.provider, "Unsupported identifier provider");
            trace.note(format!("variant: unsupported provider {}", content.provider));
            return None;
        }

        let descriptor = self
            .client
            .fetch_descriptor(content.id, content.namespace, refresh, trace)
            .await?;
        let found = candidates(&descriptor);
        trace.note(format!("variant: {} candidates for {identifier}", found.len()));

        let variant = select_variant(&found, width, height)?;
        trace.note(format!(
            "variant: chose {} for {width}x{height} crop {}x{}+{}+{}",
            variant.uri, variant.crop.width, variant.crop.height, variant.crop.x, variant.crop.y
        ));
        Some(variant)
    }
}
