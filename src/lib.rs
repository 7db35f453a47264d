//! # maus-dl
//!
//! Library for watching a small set of broadcast pages for newly published
//! episodes, downloading their image and video assets, and reporting progress
//! to a Telegram channel.
//!
//! ## Design Philosophy
//!
//! maus-dl is designed to be:
//! - **Idempotent** - A per-source dedup store guarantees every item is
//!   downloaded at most once, across any number of runs
//! - **Failure-isolating** - A broken page or a failed download never blocks
//!   the other sources or items; every caught failure reaches the error sink
//! - **Sequential by design** - Video remuxing is bandwidth- and CPU-heavy;
//!   sources and items are processed one at a time on purpose
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use maus_dl::{Config, MausDownloader, run_with_shutdown};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         production: true,
//!         notify: maus_dl::NotifyConfig {
//!             bot_token: std::env::var("BOT_TOKEN")?,
//!             target_chat: -1_001_214_301_516,
//!             error_chat: -1_001_214_301_516,
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     };
//!
//!     let downloader = Arc::new(MausDownloader::new(config)?);
//!
//!     // Run with automatic signal handling
//!     run_with_shutdown(downloader).await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Core watcher implementation (run controller + download orchestration)
pub mod downloader;
/// External encoder boundary
pub mod encoder;
/// Error types
pub mod error;
/// Per-source page extraction
pub mod extract;
/// Descriptor normalization
pub mod normalize;
/// Notification and error sinks
pub mod notify;
/// Persistent per-source dedup store
pub mod store;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;
/// Periodic watch task
pub mod watch_task;

// Re-export commonly used types
pub use config::{Config, EncoderConfig, NotifyConfig, SourcesConfig, StorageConfig};
pub use downloader::MausDownloader;
pub use encoder::{EncodeJob, Encoder, FfmpegEncoder};
pub use error::{EncodeError, Error, ExtractError, NormalizeError, Result};
pub use extract::{RegexScan, SourceScan};
pub use normalize::normalize;
pub use notify::{ErrorSink, MessageId, Notifier, TelegramNotifier};
pub use store::SeenStore;
pub use types::{Entry, MediaInformation, RawDescriptor, SourceKind};
pub use utils::format_filesize;
pub use watch_task::WatchTask;

use std::sync::Arc;

/// Helper function to run the watcher with graceful signal handling.
///
/// Spawns the watch task, waits for a termination signal, requests shutdown and
/// waits for the task to finish its current cycle. An in-flight download is
/// never interrupted mid-item; whatever was not committed to the dedup store is
/// retried on the next start.
///
/// - **Unix:** listens for SIGTERM and SIGINT.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(downloader: Arc<MausDownloader>) {
    let task = WatchTask::new(Arc::clone(&downloader));
    let mut handle = tokio::spawn(task.run());

    tokio::select! {
        _ = wait_for_signal() => {
            downloader.shutdown();
            handle.await.ok();
        }
        // Trial mode: the task finishes on its own after one cycle
        _ = &mut handle => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        _ => {
            tracing::warn!("Could not register unix signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
    }
}
