//! Descriptor normalization
//!
//! Turns a raw descriptor tree into a canonical [`MediaInformation`] value.
//! This is the only place the raw payload is inspected structurally; everything
//! downstream works with the normalized form.

use serde::Deserialize;
use url::Url;

use crate::error::{NormalizeError, Result};
use crate::types::{MediaInformation, RawDescriptor};

/// Loosely-typed view of the descriptor fields the pipeline cares about.
///
/// Every field is optional at this layer; requiredness is enforced afterwards so
/// a missing field surfaces as a precise [`NormalizeError::MissingField`] instead
/// of an opaque deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DescriptorFields {
    tracker_data: TrackerFields,
    media_resource: ResourceFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackerFields {
    #[serde(rename = "trackerClipId")]
    id: Option<String>,
    #[serde(rename = "trackerClipTitle")]
    title: Option<String>,
    #[serde(rename = "trackerClipAirTime")]
    air_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResourceFields {
    dflt: TrackFields,
    captions_hash: CaptionFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackFields {
    #[serde(rename = "videoURL")]
    video_url: Option<String>,
    #[serde(rename = "slVideoURL")]
    sl_video_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaptionFields {
    srt: Option<String>,
}

/// Normalize a raw descriptor into [`MediaInformation`].
///
/// Pure function. Fails with [`NormalizeError::MissingField`] when a required
/// field (most importantly the primary video URL) cannot be derived.
pub fn normalize(raw: &RawDescriptor) -> Result<MediaInformation> {
    let fields: DescriptorFields = serde_json::from_value(raw.as_value().clone())?;

    let unique_id = fields
        .tracker_data
        .id
        .ok_or(NormalizeError::MissingField("uniqueId"))?;
    let title = fields
        .tracker_data
        .title
        .ok_or(NormalizeError::MissingField("title"))?;
    let airtime = fields
        .tracker_data
        .air_time
        .ok_or(NormalizeError::MissingField("airtime"))?;
    let airtime_iso = airtime_to_iso(&airtime)?;

    let video_normal = https_url(
        &fields
            .media_resource
            .dflt
            .video_url
            .filter(|url| !url.is_empty())
            .ok_or(NormalizeError::MissingField("videoNormal"))?,
    )?;
    let video_alt = https_url_opt(fields.media_resource.dflt.sl_video_url)?;
    let captions_srt = https_url_opt(fields.media_resource.captions_hash.srt)?;

    Ok(MediaInformation {
        unique_id,
        title,
        airtime,
        airtime_iso,
        video_normal,
        video_alt,
        captions_srt,
    })
}

/// Parse a descriptor URL, prefixing scheme-relative `//host/path` forms with `https:`
fn https_url(url: &str) -> std::result::Result<Url, NormalizeError> {
    let absolute = if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    };
    Url::parse(&absolute).map_err(|_| NormalizeError::InvalidUrl(url.to_string()))
}

/// Optional variant of [`https_url`]: absent or empty fields stay `None`.
///
/// "No captions" is a legitimate state distinct from "present but empty"; both
/// map to `None` here, never to an empty URL.
fn https_url_opt(url: Option<String>) -> std::result::Result<Option<Url>, NormalizeError> {
    match url {
        Some(url) if !url.is_empty() => Ok(Some(https_url(&url)?)),
        _ => Ok(None),
    }
}

/// Reorder a locale airtime (`DD.MM.YYYY HH:MM`) into sortable `YYYY-MM-DDTHH-MM`.
///
/// No timezone conversion: the source's wall-clock string is preserved verbatim
/// in reordered form.
fn airtime_to_iso(airtime: &str) -> std::result::Result<String, NormalizeError> {
    let mut parts = airtime.split(['.', ' ', ':']).filter(|part| !part.is_empty());
    let mut next = || {
        parts
            .next()
            .ok_or_else(|| NormalizeError::Airtime(airtime.to_string()))
    };
    let day = next()?;
    let month = next()?;
    let year = next()?;
    let hour = next()?;
    let minute = next()?;
    Ok(format!("{year}-{month}-{day}T{hour}-{minute}"))
}
