//! Watch task — periodic execution of the run controller
//!
//! This module provides the background task that triggers watch cycles on the
//! configured interval. The run controller's single-flight guard means a slow
//! cycle is never overlapped by the next tick; a tick that fires while a run is
//! still in progress simply does nothing.
//!
//! # Behavior by mode
//!
//! - **Trial** (the default): one cycle immediately, then the task finishes.
//! - **Production**: no cycle at startup (deployment volumes may still be
//!   coming up), then one cycle per poll interval until shutdown.
//!
//! # Example
//!
//! ```no_run
//! use maus_dl::{Config, MausDownloader, WatchTask};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Arc::new(MausDownloader::new(Config::default())?);
//! let task = WatchTask::new(downloader.clone());
//!
//! // Run watch task (returns on shutdown, or after one cycle in trial mode)
//! tokio::spawn(async move {
//!     task.run().await;
//! });
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::time::{Duration, sleep};
use tracing::info;

use crate::MausDownloader;

/// Interval between shutdown checks while waiting for the next cycle
const TICK: Duration = Duration::from_secs(1);

/// Background task driving the run controller on the configured cadence
pub struct WatchTask {
    /// The watcher whose `run()` is triggered each cycle
    downloader: Arc<MausDownloader>,
}

impl WatchTask {
    /// Creates a new watch task for `downloader`
    pub fn new(downloader: Arc<MausDownloader>) -> Self {
        Self { downloader }
    }

    /// Run the watch loop until shutdown (or, in trial mode, for one cycle).
    ///
    /// The loop sleeps in short ticks so a shutdown request is picked up
    /// promptly even with long poll intervals. An in-flight cycle is never
    /// interrupted; shutdown takes effect at the next tick after it returns.
    pub async fn run(self) {
        info!("watch task started");

        if !self.downloader.config.production {
            self.downloader.run().await;
            info!("watch task finished (trial mode)");
            return;
        }

        let interval = self.downloader.config.sources.poll_interval;
        let mut last_run = Instant::now();
        loop {
            if self.downloader.is_shutdown() {
                info!("watch task shutting down");
                break;
            }
            if last_run.elapsed() >= interval {
                self.downloader.run().await;
                last_run = Instant::now();
            }
            sleep(TICK).await;
        }
        info!("watch task stopped");
    }
}
