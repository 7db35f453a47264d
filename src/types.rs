//! Core types for the discovery and download pipeline

use serde::{Deserialize, Serialize};
use url::Url;

/// The closed set of configured content sources.
///
/// Each source is one watched page with its own layout; the variant name doubles
/// as the dedup-store file name and as part of downloaded asset filenames, so the
/// serialized form must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// The most recent regular broadcast
    CurrentBroadcast,
    /// The themed digest page (irregular topical episodes)
    ThemedDigest,
    /// The special broadcast page
    SpecialBroadcast,
}

impl SourceKind {
    /// All known sources, in polling order
    pub const ALL: [Self; 3] = [
        Self::CurrentBroadcast,
        Self::ThemedDigest,
        Self::SpecialBroadcast,
    ];

    /// Stable string form, used in filenames, store paths and error labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentBroadcast => "current-broadcast",
            Self::ThemedDigest => "themed-digest",
            Self::SpecialBroadcast => "special-broadcast",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw media descriptor as published by the source, after envelope unwrapping.
///
/// The payload is kept as an opaque JSON tree: the dedup store compares and
/// persists its canonical serialization, and only the normalizer looks inside.
/// Nothing else in the pipeline may inspect it structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDescriptor(serde_json::Value);

impl RawDescriptor {
    pub(crate) fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Deterministic, key-order-independent serialization.
    ///
    /// `serde_json`'s default `Map` is backed by a `BTreeMap`, so object keys are
    /// sorted on serialization regardless of their order in the source text. Two
    /// structurally equal descriptors therefore always canonicalize identically,
    /// which is what makes dedup membership tests correct across fetches.
    pub fn canonical(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Access for the normalizer and the dedup store only
    pub(crate) fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Canonical media information derived from a raw descriptor.
///
/// Produced by [`crate::normalize::normalize`]; `video_normal` is always present
/// here, its absence is a normalization failure, not a valid record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInformation {
    /// Stable per-item identifier from the source
    pub unique_id: String,
    /// Human-readable title
    pub title: String,
    /// Original airtime string as published (locale-formatted, `DD.MM.YYYY HH:MM`)
    pub airtime: String,
    /// Airtime reformatted to a sortable, filename-safe `YYYY-MM-DDTHH-MM`
    pub airtime_iso: String,
    /// Primary video URL
    pub video_normal: Url,
    /// Optional alternate-track (signed-language) video URL
    pub video_alt: Option<Url>,
    /// Optional subtitle-track URL
    pub captions_srt: Option<Url>,
}

/// One discovered item, before dedup filtering
#[derive(Debug, Clone)]
pub struct Entry {
    /// The source that produced this item
    pub kind: SourceKind,
    /// Resolved URL of the item's preview image
    pub image: Url,
    /// The item's raw descriptor
    pub descriptor: RawDescriptor,
}
