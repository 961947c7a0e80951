use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use super::types::{ApiResponse, Message, Update, User};
use super::{AudioUpload, ChatGateway};

/// Connection timeout for Bot API requests
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time on top of the long-poll timeout before giving up on getUpdates
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Client for the Telegram Bot HTTP API.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    /// Create a client for `token` against `api_url`
    /// (normally `https://api.telegram.org`).
    pub fn new(api_url: &str, token: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(method))
            .json(params)
            .send()
            .await
            .with_context(|| format!("Failed to call {}", method))?;

        read_response(method, response).await
    }

    /// Identity of the bot behind the token.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let mut params = json!({ "timeout": timeout.as_secs() });
        if let Some(offset) = offset {
            params["offset"] = json!(offset);
        }

        let response = self
            .client
            .post(self.url("getUpdates"))
            .timeout(timeout + POLL_GRACE)
            .json(&params)
            .send()
            .await
            .context("Failed to call getUpdates")?;

        read_response("getUpdates", response).await
    }
}

async fn read_response<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body: ApiResponse<T> = response
        .json()
        .await
        .with_context(|| format!("{} returned an unreadable response (HTTP {})", method, status))?;

    if !body.ok {
        anyhow::bail!(
            "{} failed ({}): {}",
            method,
            body.error_code.map(|c| c.to_string()).unwrap_or_else(|| status.to_string()),
            body.description.unwrap_or_default()
        );
    }

    body.result
        .with_context(|| format!("{} returned ok without a result", method))
}

async fn file_part(path: &Path, mime: &str) -> Result<Part> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    Ok(Part::bytes(data).file_name(name).mime_str(mime)?)
}

#[async_trait]
impl ChatGateway for TelegramClient {
    async fn send_text(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<Message> {
        let mut params = json!({ "chat_id": chat_id, "text": text });
        if let Some(id) = reply_to {
            params["reply_to_message_id"] = json!(id);
        }
        self.call("sendMessage", &params).await
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let params = json!({ "chat_id": chat_id, "message_id": message_id, "text": text });
        // The result is the edited Message; only success matters here.
        let _: serde_json::Value = self.call("editMessageText", &params).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let params = json!({ "chat_id": chat_id, "message_id": message_id });
        let _: bool = self.call("deleteMessage", &params).await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        audio: &AudioUpload,
    ) -> Result<()> {
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", audio.caption.clone())
            .text("title", audio.title.clone())
            .text("performer", audio.performer.clone())
            .part("audio", file_part(&audio.path, "audio/mpeg").await?);

        if let Some(id) = reply_to {
            form = form.text("reply_to_message_id", id.to_string());
        }
        if let Some(duration) = audio.duration {
            form = form.text("duration", duration.to_string());
        }
        if let Some(ref thumb) = audio.thumbnail {
            form = form.part("thumbnail", file_part(thumb, "image/jpeg").await?);
        }

        let response = self
            .client
            .post(self.url("sendAudio"))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", audio.path.display()))?;

        let _: Message = read_response("sendAudio", response).await?;
        Ok(())
    }
}
