//! Notification and error sink boundaries
//!
//! The pipeline only ever talks to two narrow interfaces: a [`Notifier`] for the
//! progress/publishing messages and an [`ErrorSink`] every isolating boundary
//! funnels caught failures into. The built-in implementation of both is the
//! Telegram Bot API ([`TelegramNotifier`]); tests plug in recording doubles.
//!
//! The pipeline never depends on the sink's delivery guarantees — sink failures
//! are errors like any other and go through the same reporting path.

mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

use crate::error::{Error, Result};

/// Handle of a sent message, used to thread the completion reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageId(pub i64);

/// Outbound notification operations the pipeline consumes
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a photo (by URL) with a caption; returns the handle used for replies
    async fn send_photo(&self, photo: &Url, caption: &str) -> Result<MessageId>;

    /// Send a text message, optionally as a reply to a prior message
    async fn send_message(&self, text: &str, reply_to: Option<MessageId>) -> Result<MessageId>;

    /// Post the finished photo + videos as one batched media group
    async fn send_media_group(&self, photo: &Url, caption: &str, videos: &[PathBuf])
    -> Result<()>;
}

/// Error reporting interface used by every isolating boundary.
///
/// `label` identifies the source or item the failure occurred in. Reporting
/// itself must never fail the caller; implementations log and swallow their own
/// delivery problems.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    /// Report one caught failure
    async fn report(&self, label: &str, error: &Error);
}
