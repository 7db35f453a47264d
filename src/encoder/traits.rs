//! Encoder trait and job description

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// One encoder invocation: remux a video (with optional captions) into a file.
///
/// The output path is a staging location; the caller owns relocating the result
/// into its final place after the encoder exits successfully.
#[derive(Debug, Clone, Copy)]
pub struct EncodeJob<'a> {
    /// Video input URL
    pub video: &'a Url,
    /// Optional subtitle-track input URL, burned in as a subtitle stream
    pub captions: Option<&'a Url>,
    /// Staging file the encoder writes to
    pub output: &'a Path,
    /// Limit the encode to this duration (trial runs); full length when `None`
    pub truncate: Option<Duration>,
}

/// Capability boundary for the external media encoder
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Run one encode job to completion.
    ///
    /// # Errors
    /// Fails when the encoder cannot be launched, exits non-zero, or reports
    /// errors on stderr.
    async fn remux(&self, job: EncodeJob<'_>) -> crate::Result<()>;

    /// Implementation name for logging
    fn name(&self) -> &'static str;
}
