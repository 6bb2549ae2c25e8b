pub mod telegram;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use crate::platform::types::Update;

/// The Bot API calls the poller and the handlers depend on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-poll for updates starting at `offset`, waiting up to `timeout_secs` server-side.
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;

    /// Download a remote file into `dest_dir` and return the local path.
    async fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf>;

    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>) -> Result<()>;

    /// Upload a local file as a document.
    async fn send_document(&self, chat_id: i64, path: &Path, reply_to: Option<i64>) -> Result<()>;
}
