//! Run controller — single-flight guard, full cycle, failure isolation

use std::sync::atomic::Ordering;

use chrono::Utc;
use tracing::{debug, info};

use super::MausDownloader;
use crate::error::{Error, Result};
use crate::extract;

impl MausDownloader {
    /// Run one full watch cycle.
    ///
    /// If a previous run is still in progress the call returns immediately —
    /// no queueing, no error. Otherwise the guard is taken, the cycle executes,
    /// and the guard is cleared on every exit path. The last-successful-run
    /// marker is written only when the cycle completes without an error
    /// reaching this layer; per-source and per-item failures are isolated
    /// below and do not prevent it.
    pub async fn run(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("previous run still in progress, skipping");
            return;
        }

        info!("watch cycle started");
        match self.cycle().await {
            Ok(()) => {
                if let Err(error) = self.store.record_last_run(Utc::now()) {
                    self.errors.report("run", &error).await;
                } else {
                    info!("watch cycle finished");
                }
            }
            Err(error) => {
                self.errors.report("run", &error).await;
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// One cycle: poll every source, filter out known items, download the rest.
    ///
    /// Sources are polled one after another and items are downloaded one at a
    /// time — downloads are bandwidth- and CPU-heavy and run on a shared host,
    /// and serializing keeps failure attribution unambiguous.
    async fn cycle(&self) -> Result<()> {
        let mut entries = Vec::new();
        for scan in &self.scans {
            entries.extend(extract::extract(scan.as_ref(), &self.http, self.errors.as_ref()).await);
        }

        let mut fresh = Vec::new();
        for entry in entries {
            if !self.store.has_seen(entry.kind, &entry.descriptor)? {
                fresh.push(entry);
            }
        }
        info!(
            count = fresh.len(),
            contexts = ?fresh.iter().map(|entry| entry.kind).collect::<Vec<_>>(),
            "entries to download"
        );

        for entry in &fresh {
            if let Err(error) = self.process_entry(entry).await {
                // Store failures mean the read-modify-write cycle on persisted
                // state can no longer be trusted; end the run, the next
                // scheduled invocation retries.
                if matches!(error, Error::Store { .. }) {
                    return Err(error);
                }
                self.errors.report(entry.kind.as_str(), &error).await;
            }
        }
        Ok(())
    }
}
