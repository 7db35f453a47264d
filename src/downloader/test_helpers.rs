//! Shared test doubles and constructors for watcher tests.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

use crate::config::Config;
use crate::downloader::MausDownloader;
use crate::encoder::{EncodeJob, Encoder};
use crate::error::{EncodeError, Error, Result};
use crate::extract::SourceScan;
use crate::notify::{ErrorSink, MessageId, Notifier};
use crate::types::{Entry, RawDescriptor, SourceKind};

/// Notifier double that records every call instead of talking to a sink
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub photos: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<(String, Option<MessageId>)>>,
    pub media_groups: Mutex<Vec<usize>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_photo(&self, _photo: &Url, caption: &str) -> Result<MessageId> {
        let mut photos = self.photos.lock().unwrap();
        photos.push(caption.to_string());
        Ok(MessageId(photos.len() as i64))
    }

    async fn send_message(&self, text: &str, reply_to: Option<MessageId>) -> Result<MessageId> {
        let mut messages = self.messages.lock().unwrap();
        messages.push((text.to_string(), reply_to));
        Ok(MessageId(1000 + messages.len() as i64))
    }

    async fn send_media_group(
        &self,
        _photo: &Url,
        _caption: &str,
        videos: &[PathBuf],
    ) -> Result<()> {
        self.media_groups.lock().unwrap().push(videos.len());
        Ok(())
    }
}

/// Error sink double collecting `(label, rendered error)` pairs
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub reports: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ErrorSink for RecordingSink {
    async fn report(&self, label: &str, error: &Error) {
        self.reports
            .lock()
            .unwrap()
            .push((label.to_string(), error.to_string()));
    }
}

/// Encoder double that writes a placeholder file instead of invoking ffmpeg
#[derive(Default)]
pub(crate) struct StubEncoder {
    pub calls: AtomicUsize,
    /// Whether each invocation carried a captions input, in call order
    pub captions_seen: Mutex<Vec<bool>>,
    /// Fail the next invocation once, then succeed again
    pub fail_next: AtomicBool,
}

#[async_trait]
impl Encoder for StubEncoder {
    async fn remux(&self, job: EncodeJob<'_>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.captions_seen
            .lock()
            .unwrap()
            .push(job.captions.is_some());
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(EncodeError::Failed {
                status: "1".to_string(),
                stderr: "stubbed failure".to_string(),
            }
            .into());
        }
        std::fs::write(job.output, b"encoded video contents")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Config rooted in a temp directory, trial mode, all sources enabled
pub(crate) fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.storage_dir = dir.join("files");
    config.storage.file_tag = "maus".to_string();
    config
}

pub(crate) struct TestFixture {
    pub downloader: MausDownloader,
    pub notifier: Arc<RecordingNotifier>,
    pub sink: Arc<RecordingSink>,
    pub encoder: Arc<StubEncoder>,
    /// Keeps the storage tree alive for the test's duration
    pub _tmp: TempDir,
}

/// Build a watcher with recording doubles and the given scans
pub(crate) fn create_test_downloader(scans: Vec<Box<dyn SourceScan>>) -> TestFixture {
    create_test_downloader_with(scans, |_| {})
}

/// Same as [`create_test_downloader`] with a config hook
pub(crate) fn create_test_downloader_with(
    scans: Vec<Box<dyn SourceScan>>,
    adjust: impl FnOnce(&mut Config),
) -> TestFixture {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    adjust(&mut config);

    let notifier = Arc::new(RecordingNotifier::default());
    let sink = Arc::new(RecordingSink::default());
    let encoder = Arc::new(StubEncoder::default());

    let downloader = MausDownloader::with_collaborators(
        config,
        scans,
        encoder.clone(),
        notifier.clone(),
        sink.clone(),
    )
    .unwrap();

    TestFixture {
        downloader,
        notifier,
        sink,
        encoder,
        _tmp: tmp,
    }
}

/// Entry pointing at `image_url` with a parsed descriptor
pub(crate) fn test_entry(kind: SourceKind, image_url: &str, descriptor_json: &str) -> Entry {
    Entry {
        kind,
        image: Url::parse(image_url).unwrap(),
        descriptor: RawDescriptor::new(serde_json::from_str(descriptor_json).unwrap()),
    }
}

/// A complete descriptor with the given id; alt/captions toggled by the flags
pub(crate) fn descriptor_json(unique_id: &str, with_alt: bool, with_captions: bool) -> String {
    let alt = if with_alt {
        r#", "slVideoURL": "//host/sl.m3u8""#
    } else {
        ""
    };
    let captions = if with_captions {
        r#""srt": "//host/captions.srt""#
    } else {
        ""
    };
    format!(
        r#"{{
            "trackerData": {{
                "trackerClipId": "{unique_id}",
                "trackerClipTitle": "Die Sendung vom 01.02.2023",
                "trackerClipAirTime": "01.02.2023 07:05"
            }},
            "mediaResource": {{
                "dflt": {{"videoURL": "//host/video.m3u8"{alt}}},
                "captionsHash": {{{captions}}}
            }}
        }}"#
    )
}
