//! Per-source page extraction
//!
//! Each watched page gets a [`SourceScan`]: a small strategy that knows the page
//! URL and how to pull image and descriptor URL fragments out of the page text.
//! The shared [`extract`] pipeline does the rest — fetching, the image/descriptor
//! count invariant, envelope unwrapping — so new sources are added without
//! touching pipeline logic.
//!
//! Extraction never lets a failure escape: anything that goes wrong inside one
//! source is reported to the error sink with the source as label and the source
//! contributes zero entries, leaving other sources unaffected.

mod envelope;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use envelope::unwrap_descriptor;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{Error, ExtractError, Result};
use crate::notify::ErrorSink;
use crate::types::{Entry, SourceKind};

/// Per-source page scanning strategy.
///
/// Implementations locate image URL fragments and descriptor URLs in one page's
/// text. Fragments are resolved against [`SourceScan::page_url`] by the shared
/// pipeline; implementations only deal with page text.
pub trait SourceScan: Send + Sync {
    /// The source this scan belongs to
    fn kind(&self) -> SourceKind;

    /// The page to fetch
    fn page_url(&self) -> &Url;

    /// Image URL fragments found in the page text, deduplicated in first-seen
    /// order (pages enumerate the same image once per title variant)
    fn image_urls(&self, body: &str) -> Vec<String>;

    /// Descriptor URL fragments found in the page text, in page order
    fn descriptor_urls(&self, body: &str) -> Vec<String>;
}

/// Regex-based [`SourceScan`] covering the built-in sources
pub struct RegexScan {
    kind: SourceKind,
    page: Url,
    image_pattern: Regex,
    descriptor_pattern: Regex,
}

impl RegexScan {
    /// Build a scan from a page URL and the two capture patterns.
    ///
    /// Both patterns must have exactly one capture group holding the URL
    /// fragment.
    pub fn new(
        kind: SourceKind,
        page: Url,
        image_pattern: &str,
        descriptor_pattern: &str,
    ) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| Error::Config {
                message: format!("invalid scan pattern for {kind}: {err}"),
                key: Some("sources".to_string()),
            })
        };
        Ok(Self {
            kind,
            page,
            image_pattern: compile(image_pattern)?,
            descriptor_pattern: compile(descriptor_pattern)?,
        })
    }

    /// Scan for the current-broadcast page
    pub fn current_broadcast() -> Result<Self> {
        Self::new(
            SourceKind::CurrentBroadcast,
            Url::parse("https://www.wdrmaus.de/aktuelle-sendung/")?,
            r#"aktuelle-sendung/([^"]+\.jpg)"#,
            DESCRIPTOR_PATTERN,
        )
    }

    /// Scan for the themed-digest page
    pub fn themed_digest() -> Result<Self> {
        Self::new(
            SourceKind::ThemedDigest,
            Url::parse("https://www.wdrmaus.de/extras/mausthemen/mausblick/")?,
            r#"<img src="(imggen/[^"]+\.jpg)"#,
            DESCRIPTOR_PATTERN,
        )
    }

    /// Scan for the special-broadcast page
    pub fn special_broadcast() -> Result<Self> {
        Self::new(
            SourceKind::SpecialBroadcast,
            Url::parse("https://www.wdrmaus.de/extras/mausthemen/corona/")?,
            r#"<img src="(?:\.\./)*extras/mausthemen/corona/(imggen/[^"]+\.jpg)"#,
            DESCRIPTOR_PATTERN,
        )
    }

    /// The built-in scan for `kind`
    pub fn for_kind(kind: SourceKind) -> Result<Self> {
        match kind {
            SourceKind::CurrentBroadcast => Self::current_broadcast(),
            SourceKind::ThemedDigest => Self::themed_digest(),
            SourceKind::SpecialBroadcast => Self::special_broadcast(),
        }
    }

    fn captures(&self, pattern: &Regex, body: &str) -> Vec<String> {
        pattern
            .captures_iter(body)
            .filter_map(|captures| captures.get(1))
            .map(|fragment| fragment.as_str().to_string())
            .collect()
    }
}

/// Descriptor endpoints share one URL shape across all pages
const DESCRIPTOR_PATTERN: &str = r#"(https:[^'"]+\d+\.js)"#;

impl SourceScan for RegexScan {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn page_url(&self) -> &Url {
        &self.page
    }

    fn image_urls(&self, body: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.captures(&self.image_pattern, body)
            .into_iter()
            .filter(|fragment| seen.insert(fragment.clone()))
            .collect()
    }

    fn descriptor_urls(&self, body: &str) -> Vec<String> {
        self.captures(&self.descriptor_pattern, body)
    }
}

/// Extract all currently published entries for one source.
///
/// Never fails past this boundary: any error is reported to `errors` labelled
/// with the source and the source yields an empty list, so one broken page does
/// not block the others.
pub async fn extract(
    scan: &dyn SourceScan,
    client: &reqwest::Client,
    errors: &dyn ErrorSink,
) -> Vec<Entry> {
    match scan_source(scan, client).await {
        Ok(entries) => entries,
        Err(error) => {
            errors.report(scan.kind().as_str(), &error).await;
            Vec::new()
        }
    }
}

async fn scan_source(scan: &dyn SourceScan, client: &reqwest::Client) -> Result<Vec<Entry>> {
    let kind = scan.kind();
    let page = scan.page_url();
    let body = fetch_text(client, page.clone()).await?;

    let images = resolve(page, scan.image_urls(&body))?;
    let descriptors = resolve(page, scan.descriptor_urls(&body))?;
    debug!(
        context = %kind,
        images = images.len(),
        descriptors = descriptors.len(),
        "scanned source page"
    );

    // Images and descriptors are paired by position; unequal counts mean the
    // page layout changed and pairing would silently attach wrong metadata.
    if images.len() != descriptors.len() {
        return Err(ExtractError::CountMismatch {
            context: kind,
            images: images.len(),
            descriptors: descriptors.len(),
        }
        .into());
    }

    let mut entries = Vec::with_capacity(images.len());
    for (image, descriptor_url) in images.into_iter().zip(descriptors) {
        let body = fetch_text(client, descriptor_url).await?;
        let descriptor = envelope::unwrap_descriptor(&body)?;
        entries.push(Entry {
            kind,
            image,
            descriptor,
        });
    }
    Ok(entries)
}

fn resolve(base: &Url, fragments: Vec<String>) -> Result<Vec<Url>> {
    fragments
        .into_iter()
        .map(|fragment| Ok(base.join(&fragment)?))
        .collect()
}

async fn fetch_text(client: &reqwest::Client, url: Url) -> Result<String> {
    Ok(client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?)
}
