//! Per-item download orchestration
//!
//! For one new item, strictly in order: starting notification, image download,
//! primary video encode, optional alternate-track encode, completion report,
//! and only then the dedup commit. Everything is staged first and relocated
//! into the storage directory after the producing step finished, so a crash
//! mid-write never leaves a partial file under a final name.

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use super::MausDownloader;
use crate::encoder::EncodeJob;
use crate::error::Result;
use crate::normalize::normalize;
use crate::types::{Entry, MediaInformation, SourceKind};
use crate::utils::{asset_prefix, extension_from_url, format_filesize, promote};

impl MausDownloader {
    /// Download and publish one new item, committing it to the dedup store
    /// only after the full sequence succeeded.
    ///
    /// # Errors
    /// Any failing step aborts the item with no dedup commit; the item is
    /// picked up again on the next run.
    pub(crate) async fn process_entry(&self, entry: &Entry) -> Result<()> {
        let info = normalize(&entry.descriptor)?;
        let prefix = asset_prefix(&self.config.storage.file_tag, entry.kind, &info);
        info!(
            context = %entry.kind,
            title = %info.title,
            airtime = %info.airtime,
            "downloading new item"
        );

        let caption = item_caption(entry.kind, &info);
        let begin = self
            .notifier
            .send_photo(&entry.image, &format!("Start download...\n\n{caption}"))
            .await?;

        self.prepare_directories()?;

        let image_name = format!("{prefix}1image.{}", extension_from_url(&entry.image, "jpg"));
        self.download_image(&entry.image, &image_name).await?;

        let truncate = self.config.effective_truncate();
        let normal_name = format!("{prefix}2normal.mp4");
        self.encode_video(
            &info.video_normal,
            info.captions_srt.as_ref(),
            &normal_name,
            truncate,
        )
        .await?;
        let mut videos = vec![self.config.storage.storage_dir.join(&normal_name)];

        if let Some(alt) = &info.video_alt {
            let alt_name = format!("{prefix}3alt.mp4");
            self.encode_video(alt, info.captions_srt.as_ref(), &alt_name, truncate)
                .await?;
            videos.push(self.config.storage.storage_dir.join(alt_name));
        }

        if self.config.notify.send_media_group {
            self.notifier
                .send_media_group(&entry.image, &caption, &videos)
                .await?;
        }

        let report = self.completion_report(&prefix)?;
        self.notifier.send_message(&report, Some(begin)).await?;

        self.store.mark_seen(entry.kind, &entry.descriptor)?;
        Ok(())
    }

    fn prepare_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.storage.storage_dir)?;
        std::fs::create_dir_all(self.config.storage.staging_dir())?;
        Ok(())
    }

    /// Stream the preview image into staging, then promote it
    async fn download_image(&self, url: &Url, name: &str) -> Result<()> {
        let staging = self.config.storage.staging_dir().join(name);
        let target = self.config.storage.storage_dir.join(name);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        let mut file = tokio::fs::File::create(&staging).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        drop(file);

        promote(&staging, &target)?;
        debug!(file = %target.display(), "image downloaded");
        Ok(())
    }

    /// Run one encoder job into staging, then promote the finished file
    async fn encode_video(
        &self,
        video: &Url,
        captions: Option<&Url>,
        name: &str,
        truncate: Option<std::time::Duration>,
    ) -> Result<()> {
        let staging = self.config.storage.staging_dir().join(name);
        let target = self.config.storage.storage_dir.join(name);

        self.encoder
            .remux(EncodeJob {
                video,
                captions,
                output: &staging,
                truncate,
            })
            .await?;

        promote(&staging, &target)?;
        debug!(
            file = %target.display(),
            encoder = self.encoder.name(),
            "video ready"
        );
        Ok(())
    }

    /// List every produced `<prefix>*` file with a human-readable size
    fn completion_report(&self, prefix: &str) -> Result<String> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.config.storage.storage_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(suffix) = name.strip_prefix(prefix) {
                files.push((suffix.to_string(), entry.metadata()?.len()));
            }
        }
        files.sort();

        let mut report = format!("finished download\n\n{prefix}\n");
        for (suffix, size) in files {
            report.push_str(&format!("{} {suffix}\n", format_filesize(size)));
        }
        Ok(report.trim_end().to_string())
    }
}

/// Caption shared by the starting notification and the public media group.
///
/// Absent optional URLs are omitted entirely, never rendered as blank lines.
pub(crate) fn item_caption(kind: SourceKind, info: &MediaInformation) -> String {
    let mut caption = format!("{}\n{} #{kind}", info.title, info.airtime);
    caption.push_str(&format!("\nVideo: {}", info.video_normal));
    if let Some(alt) = &info.video_alt {
        caption.push_str(&format!("\nAlt: {alt}"));
    }
    if let Some(srt) = &info.captions_srt {
        caption.push_str(&format!("\nSubtitles: {srt}"));
    }
    caption
}
