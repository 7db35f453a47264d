//! CLI encoder implementation using the external ffmpeg binary

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use super::traits::{EncodeJob, Encoder};
use crate::error::EncodeError;

/// CLI encoder using the external `ffmpeg` binary
///
/// Copies audio and subtitle streams, converts the subtitle track to a
/// container-compatible codec and transcodes video to the configured codec.
/// Stderr is captured and treated as part of the failure signal: ffmpeg runs
/// with `-v error`, so any stderr output means something went wrong even when
/// the exit code is zero.
pub struct FfmpegEncoder {
    binary_path: PathBuf,
    video_codec: String,
}

impl FfmpegEncoder {
    /// Create an encoder with an explicit binary path
    pub fn new(binary_path: PathBuf, video_codec: impl Into<String>) -> Self {
        Self {
            binary_path,
            video_codec: video_codec.into(),
        }
    }

    /// Attempt to find ffmpeg in PATH.
    ///
    /// Uses the `which` crate; returns `None` when the binary is not installed.
    pub fn from_path(video_codec: impl Into<String>) -> Option<Self> {
        which::which("ffmpeg")
            .ok()
            .map(|path| Self::new(path, video_codec))
    }

    fn build_args(&self, job: &EncodeJob<'_>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-v".into(), "error".into()];
        if let Some(truncate) = job.truncate {
            args.push("-t".into());
            args.push(truncate.as_secs().to_string().into());
        }
        args.push("-i".into());
        args.push(job.video.as_str().into());
        if let Some(captions) = job.captions {
            args.push("-i".into());
            args.push(captions.as_str().into());
        }
        args.push("-c".into());
        args.push("copy".into());
        args.push("-c:s".into());
        args.push("mov_text".into());
        args.push("-c:v".into());
        args.push(self.video_codec.as_str().into());
        args.push(job.output.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn remux(&self, job: EncodeJob<'_>) -> crate::Result<()> {
        let args = self.build_args(&job);
        debug!(
            binary = %self.binary_path.display(),
            output = %job.output.display(),
            truncate = ?job.truncate,
            "starting encode"
        );

        let output = Command::new(&self.binary_path)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|err| EncodeError::Spawn(err.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() || !stderr.is_empty() {
            return Err(EncodeError::Failed {
                status: output
                    .status
                    .code()
                    .map_or_else(|| "terminated by signal".to_string(), |code| code.to_string()),
                stderr,
            }
            .into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use url::Url;

    fn job<'a>(video: &'a Url, captions: Option<&'a Url>, output: &'a Path) -> EncodeJob<'a> {
        EncodeJob {
            video,
            captions,
            output,
            truncate: None,
        }
    }

    #[test]
    fn builds_full_remux_command() {
        let encoder = FfmpegEncoder::new(PathBuf::from("/usr/bin/ffmpeg"), "libx264");
        let video = Url::parse("https://host/video.m3u8").unwrap();
        let captions = Url::parse("https://host/captions.srt").unwrap();
        let output = Path::new("/tmp/out.mp4");

        let args = encoder.build_args(&job(&video, Some(&captions), output));
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-y",
                "-v",
                "error",
                "-i",
                "https://host/video.m3u8",
                "-i",
                "https://host/captions.srt",
                "-c",
                "copy",
                "-c:s",
                "mov_text",
                "-c:v",
                "libx264",
                "/tmp/out.mp4",
            ]
        );
    }

    #[test]
    fn omits_captions_input_when_absent() {
        let encoder = FfmpegEncoder::new(PathBuf::from("ffmpeg"), "libx264");
        let video = Url::parse("https://host/video.m3u8").unwrap();
        let output = Path::new("/tmp/out.mp4");

        let args = encoder.build_args(&job(&video, None, output));
        let rendered: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(rendered.iter().filter(|arg| *arg == "-i").count(), 1);
        assert!(!rendered.contains(&"https://host/captions.srt".to_string()));
    }

    #[test]
    fn truncation_comes_from_the_job_not_a_literal() {
        let encoder = FfmpegEncoder::new(PathBuf::from("ffmpeg"), "libx264");
        let video = Url::parse("https://host/video.m3u8").unwrap();
        let output = Path::new("/tmp/out.mp4");
        let mut j = job(&video, None, output);
        j.truncate = Some(Duration::from_secs(12));

        let args = encoder.build_args(&j);
        let rendered: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        let position = rendered.iter().position(|arg| arg == "-t").unwrap();
        assert_eq!(rendered[position + 1], "12");
    }

    #[test]
    fn from_path_returns_none_for_missing_binary() {
        assert!(which::which("nonexistent-ffmpeg-binary-xyz").is_err());
    }
}
