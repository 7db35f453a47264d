//! Core watcher implementation split into focused submodules.
//!
//! The [`MausDownloader`] struct and its methods are organized by domain:
//! - `run` - Run controller: single-flight guard, cycle, failure isolation
//! - `assets` - Per-item download orchestration

mod assets;
mod run;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::config::Config;
use crate::encoder::{Encoder, FfmpegEncoder};
use crate::error::{EncodeError, Result};
use crate::extract::{RegexScan, SourceScan};
use crate::notify::{ErrorSink, Notifier, TelegramNotifier};
use crate::store::SeenStore;

/// Main watcher instance.
///
/// Owns the configured sources, the dedup store and the external collaborators
/// (encoder, notification sink, error sink). One instance corresponds to one
/// deployment; wrap it in an [`Arc`] to share it with the watch task.
pub struct MausDownloader {
    /// Configuration (shared with spawned work)
    pub(crate) config: Arc<Config>,
    /// HTTP client for page, descriptor and image fetches
    pub(crate) http: reqwest::Client,
    /// Persistent per-source dedup store
    pub(crate) store: SeenStore,
    /// Page scans, one per enabled source
    pub(crate) scans: Vec<Box<dyn SourceScan>>,
    /// External encoder boundary
    pub(crate) encoder: Arc<dyn Encoder>,
    /// Notification sink
    pub(crate) notifier: Arc<dyn Notifier>,
    /// Error sink every isolating boundary reports into
    pub(crate) errors: Arc<dyn ErrorSink>,
    /// Single-flight guard: set while a run is in progress
    pub(crate) running: AtomicBool,
    /// Cooperative shutdown flag checked by the watch task
    shutdown: AtomicBool,
}

impl MausDownloader {
    /// Create a watcher with the built-in collaborators: the regex scans for
    /// the enabled sources, the Telegram sink and the ffmpeg CLI encoder.
    ///
    /// # Errors
    /// Fails when the notification config is incomplete or no ffmpeg binary
    /// can be located.
    pub fn new(config: Config) -> Result<Self> {
        let telegram = Arc::new(TelegramNotifier::new(&config.notify)?);

        let encoder: Arc<dyn Encoder> = match &config.encoder.ffmpeg_path {
            Some(path) => Arc::new(FfmpegEncoder::new(
                path.clone(),
                config.encoder.video_codec.clone(),
            )),
            None if config.encoder.search_path => Arc::new(
                FfmpegEncoder::from_path(config.encoder.video_codec.clone())
                    .ok_or(EncodeError::BinaryNotFound)?,
            ),
            None => return Err(EncodeError::BinaryNotFound.into()),
        };

        let scans = default_scans(&config)?;
        Self::with_collaborators(config, scans, encoder, telegram.clone(), telegram)
    }

    /// Create a watcher with explicit collaborators.
    ///
    /// This is the seam embedders and tests use to substitute scans, the
    /// encoder or the sinks without touching pipeline logic.
    pub fn with_collaborators(
        config: Config,
        scans: Vec<Box<dyn SourceScan>>,
        encoder: Arc<dyn Encoder>,
        notifier: Arc<dyn Notifier>,
        errors: Arc<dyn ErrorSink>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .user_agent("maus-dl")
            .build()?;
        let store = SeenStore::new(config.storage.state_dir());

        Ok(Self {
            config: Arc::new(config),
            http,
            store,
            scans,
            encoder,
            notifier,
            errors,
            running: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Read access to the dedup store (e.g. for status inspection)
    #[must_use]
    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    /// Signal the watch task to stop after the current cycle.
    ///
    /// An in-flight download is never cancelled; it either completes or fails,
    /// and an interrupted item is retried on the next start because it was
    /// never committed to the dedup store.
    pub fn shutdown(&self) {
        info!("shutdown requested");
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Build the built-in scans for the sources enabled in `config`
fn default_scans(config: &Config) -> Result<Vec<Box<dyn SourceScan>>> {
    config
        .sources
        .enabled
        .iter()
        .map(|kind| Ok(Box::new(RegexScan::for_kind(*kind)?) as Box<dyn SourceScan>))
        .collect()
}
