//! Configuration types for maus-dl

use crate::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage layout configuration (asset directory, staging, dedup state)
///
/// Groups settings related to where downloaded assets and persisted pipeline
/// state live. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory downloaded assets are placed in (default: "./files")
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Staging directory for in-flight downloads.
    ///
    /// Must be on the same filesystem as `storage_dir` so the final promotion is
    /// a single rename. Defaults to `<storage_dir>/.staging` when unset.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Directory holding the per-source dedup sets and the last-run marker.
    ///
    /// Defaults to `<storage_dir>/.downloaded` when unset.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Collection tag used as the first component of asset filenames (default: "maus")
    #[serde(default = "default_file_tag")]
    pub file_tag: String,
}

impl StorageConfig {
    /// Effective staging directory (explicit setting or `<storage_dir>/.staging`)
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.storage_dir.join(".staging"))
    }

    /// Effective state directory (explicit setting or `<storage_dir>/.downloaded`)
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.storage_dir.join(".downloaded"))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            staging_dir: None,
            state_dir: None,
            file_tag: default_file_tag(),
        }
    }
}

/// Source polling configuration
///
/// Which sources are watched and how often a full cycle runs.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Sources to watch (default: all known sources)
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<SourceKind>,

    /// Interval between watch cycles in production mode (default: 35 minutes)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// External encoder configuration
///
/// Settings for the ffmpeg invocation that remuxes videos with captions.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path to the ffmpeg executable (auto-detected from PATH if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Whether to search PATH for ffmpeg if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Video codec the encoder transcodes to (default: "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encode duration limit applied outside production mode (default: 5 seconds).
    ///
    /// Keeps trial runs fast; ignored entirely when [`Config::production`] is set.
    #[serde(default = "default_trial_truncate")]
    pub trial_truncate: Duration,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            search_path: true,
            video_codec: default_video_codec(),
            trial_truncate: default_trial_truncate(),
        }
    }
}

/// Notification sink configuration (Telegram Bot API)
///
/// Target identifiers for the progress, error and optional public channels.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bot token used to authenticate against the Bot API
    #[serde(default)]
    pub bot_token: String,

    /// Custom Bot API root (e.g. a local Bot API server); official API if None
    #[serde(default)]
    pub api_root: Option<String>,

    /// Chat the starting/finished progress messages go to
    #[serde(default)]
    pub target_chat: i64,

    /// Chat errors are reported to
    #[serde(default)]
    pub error_chat: i64,

    /// Optional public chat the finished media group is posted to
    #[serde(default)]
    pub public_chat: Option<i64>,

    /// Whether to post the finished photo+video media group to `public_chat`
    /// (default: false)
    #[serde(default)]
    pub send_media_group: bool,
}

/// Main configuration for [`crate::MausDownloader`]
///
/// All sections have sensible defaults; a deployment typically only sets the
/// notification credentials and flips `production` on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Production mode: full-length encodes, interval polling, no run at startup.
    ///
    /// Off by default; trial mode truncates encodes and runs a single cycle
    /// immediately.
    #[serde(default)]
    pub production: bool,

    /// Storage layout
    #[serde(default)]
    pub storage: StorageConfig,

    /// Source polling
    #[serde(default)]
    pub sources: SourcesConfig,

    /// External encoder
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Notification sink
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Encode truncation to apply for the current mode.
    ///
    /// `None` in production (full-length encode), the configured trial duration
    /// otherwise.
    #[must_use]
    pub fn effective_truncate(&self) -> Option<Duration> {
        if self.production {
            None
        } else {
            Some(self.encoder.trial_truncate)
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./files")
}

fn default_file_tag() -> String {
    "maus".to_string()
}

fn default_enabled_sources() -> Vec<SourceKind> {
    SourceKind::ALL.to_vec()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(35 * 60)
}

fn default_true() -> bool {
    true
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_trial_truncate() -> Duration {
    Duration::from_secs(5)
}
