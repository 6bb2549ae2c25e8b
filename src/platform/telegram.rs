use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::platform::types::{ApiResponse, File, Update, User};
use crate::platform::Transport;

/// Telegram rejects messages longer than 4096 characters.
const MAX_MESSAGE_LEN: usize = 4000;

/// Extra client-side slack on top of the server-side long-poll wait.
const POLL_GRACE_SECS: u64 = 10;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Bot API client: one POST per method to `<api_url>/bot<token>/<method>`.
pub struct TelegramApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramApi {
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + POLL_GRACE_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.token, file_path)
    }

    /// Invoke a Bot API method with flat form parameters and unwrap the `result`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        debug!("Calling Telegram method {}", method);

        // Error statuses still carry the JSON envelope, so the body is parsed either way.
        let response = self
            .client
            .post(self.method_url(method))
            .form(params)
            .send()
            .await
            .with_context(|| format!("Failed to send Telegram {} request", method))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Telegram {} response", method))?;

        envelope.into_result(method)
    }

    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &[]).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", &[("file_id", file_id.to_string())])
            .await
    }
}

#[async_trait]
impl Transport for TelegramApi {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>> {
        let mut params = vec![("timeout", timeout_secs.to_string())];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        self.call("getUpdates", &params).await
    }

    async fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let file = self.get_file(file_id).await?;
        let file_path = file
            .file_path
            .with_context(|| format!("Telegram getFile: missing file_path for {}", file.file_id))?;

        debug!(
            "Downloading {} ({} bytes)",
            file_path,
            file.file_size.unwrap_or_default()
        );

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .context("Failed to download Telegram file")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Telegram file download failed ({}): {}", status, file_path);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read Telegram file body")?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .with_context(|| format!("Failed to create directories: {}", dest_dir.display()))?;

        let mut local_name = Uuid::new_v4().to_string();
        if let Some(ext) = Path::new(&file_path).extension().and_then(|e| e.to_str()) {
            local_name.push('.');
            local_name.push_str(ext);
        }
        let local_path = dest_dir.join(local_name);

        tokio::fs::write(&local_path, &bytes)
            .await
            .with_context(|| format!("Failed to write file: {}", local_path.display()))?;

        Ok(local_path)
    }

    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()> {
        for (i, chunk) in split_message(text, MAX_MESSAGE_LEN).into_iter().enumerate() {
            let mut params = vec![("chat_id", chat_id.to_string()), ("text", chunk)];
            if let (0, Some(reply_to)) = (i, reply_to) {
                params.push(("reply_to_message_id", reply_to.to_string()));
            }
            self.call::<serde_json::Value>("sendMessage", &params)
                .await?;
        }
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, path: &Path, reply_to: Option<i64>) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(bytes).file_name(file_name));
        if let Some(reply_to) = reply_to {
            form = form.text("reply_to_message_id", reply_to.to_string());
        }

        debug!("Calling Telegram method sendDocument");

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .context("Failed to send Telegram sendDocument request")?;

        let envelope: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Telegram sendDocument response")?;

        envelope.into_result("sendDocument").map(|_| ())
    }
}
