//! Utility functions for filenames, file promotion and size formatting

use std::path::Path;

use url::Url;

use crate::types::{MediaInformation, SourceKind};

/// Format a byte count as a human-readable size.
///
/// Scales by powers of 1000 with a single-letter unit (`''`, `k`, `M`, `G`) and
/// one decimal place, e.g. `1.5MB`, `500.0B`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_filesize(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["", "k", "M", "G"];
    let mut rest = bytes as f64;
    let mut unit = 0;
    while rest > 1000.0 && unit < UNITS.len() - 1 {
        rest /= 1000.0;
        unit += 1;
    }
    format!("{rest:.1}{}B", UNITS[unit])
}

/// Deterministic filename prefix for one item's assets.
///
/// Combines the collection tag, the source, the sortable airtime and the item id,
/// ending in `-` so asset slot names (`1image.jpg`, `2normal.mp4`, `3alt.mp4`)
/// append directly.
#[must_use]
pub fn asset_prefix(tag: &str, kind: SourceKind, info: &MediaInformation) -> String {
    format!("{tag}-{kind}-{}-{}-", info.airtime_iso, info.unique_id)
}

/// File extension of the last URL path segment, or `default` if there is none
pub(crate) fn extension_from_url(url: &Url, default: &str) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(default)
        .to_string()
}

/// Relocate a completed staging file into its final place.
///
/// A plain rename: staging and storage are required to be on the same
/// filesystem, so a half-written file can never appear under the final name.
pub(crate) fn promote(staging: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::rename(staging, target)
}
