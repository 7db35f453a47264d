//! Telegram Bot API implementation of the notification and error sinks

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{error, info};
use url::Url;

use super::{ErrorSink, MessageId, Notifier};
use crate::config::NotifyConfig;
use crate::error::{Error, Result};

const OFFICIAL_API_ROOT: &str = "https://api.telegram.org";

/// Telegram Bot API client covering the three operations the pipeline needs
///
/// Supports a custom API root (e.g. a local Bot API server) for deployments
/// that upload large video files.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_root: String,
    token: String,
    target_chat: i64,
    error_chat: i64,
    public_chat: Option<i64>,
}

impl TelegramNotifier {
    /// Create a notifier from the notification config
    ///
    /// # Errors
    /// Returns a configuration error when the bot token is empty, or when the
    /// HTTP client cannot be created.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(Error::Config {
                message: "bot token must not be empty".to_string(),
                key: Some("notify.bot_token".to_string()),
            });
        }

        let api_root = config
            .api_root
            .clone()
            .unwrap_or_else(|| OFFICIAL_API_ROOT.to_string());
        if config.api_root.is_some() {
            info!(api_root = %api_root, "using custom Bot API endpoint");
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .user_agent("maus-dl notifier")
            .build()?;

        Ok(Self {
            client,
            api_root,
            token: config.bot_token.clone(),
            target_chat: config.target_chat,
            error_chat: config.error_chat,
            public_chat: config.public_chat,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_root, self.token)
    }

    async fn call(&self, method: &str, payload: &Value) -> Result<Value> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        Self::check_ok(method, status, body)
    }

    fn check_ok(method: &str, status: reqwest::StatusCode, body: Value) -> Result<Value> {
        if body.pointer("/ok").and_then(Value::as_bool) != Some(true) {
            let description = body
                .pointer("/description")
                .and_then(Value::as_str)
                .unwrap_or("no description");
            return Err(Error::Notify(format!(
                "{method} failed ({status}): {description}"
            )));
        }
        Ok(body)
    }

    fn message_id(method: &str, body: &Value) -> Result<MessageId> {
        body.pointer("/result/message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| Error::Notify(format!("{method} response carries no message id")))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_photo(&self, photo: &Url, caption: &str) -> Result<MessageId> {
        let payload = json!({
            "chat_id": self.target_chat,
            "photo": photo.as_str(),
            "caption": caption,
            "disable_notification": true,
        });
        let body = self.call("sendPhoto", &payload).await?;
        Self::message_id("sendPhoto", &body)
    }

    async fn send_message(&self, text: &str, reply_to: Option<MessageId>) -> Result<MessageId> {
        let mut payload = json!({
            "chat_id": self.target_chat,
            "text": text,
        });
        if let (Some(MessageId(id)), Some(object)) = (reply_to, payload.as_object_mut()) {
            object.insert("reply_to_message_id".to_string(), json!(id));
        }
        let body = self.call("sendMessage", &payload).await?;
        Self::message_id("sendMessage", &body)
    }

    async fn send_media_group(
        &self,
        photo: &Url,
        caption: &str,
        videos: &[PathBuf],
    ) -> Result<()> {
        let chat = self.public_chat.ok_or_else(|| Error::Config {
            message: "media group requested but no public chat configured".to_string(),
            key: Some("notify.public_chat".to_string()),
        })?;

        let mut media = vec![json!({
            "type": "photo",
            "media": photo.as_str(),
            "caption": caption,
        })];
        let mut form = reqwest::multipart::Form::new();
        for (index, path) in videos.iter().enumerate() {
            let name = format!("video{index}");
            media.push(json!({
                "type": "video",
                "media": format!("attach://{name}"),
            }));
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.clone());
            let bytes = tokio::fs::read(path).await?;
            form = form.part(
                name,
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        }
        form = form
            .text("chat_id", chat.to_string())
            .text("media", serde_json::to_string(&media)?);

        let response = self
            .client
            .post(self.method_url("sendMediaGroup"))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        Self::check_ok("sendMediaGroup", status, body)?;
        Ok(())
    }
}

#[async_trait]
impl ErrorSink for TelegramNotifier {
    async fn report(&self, label: &str, report: &Error) {
        error!(context = %label, error = %report, "pipeline failure");
        let text = format!("{label}\n```\n{report}\n```");
        let payload = json!({
            "chat_id": self.error_chat,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Err(err) = self.call("sendMessage", &payload).await {
            // Last line of defense: a failing error report must never take the
            // run down with it.
            error!(error = %err, "failed to deliver error report to sink");
        }
    }
}
