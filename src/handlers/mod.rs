pub mod audio;
pub mod command;
pub mod document;
pub mod photo;

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::media::{AudioConverter, FaceDetector};
use crate::platform::Transport;
use crate::storage::MediaStore;

/// Everything a handler needs to answer one message.
pub struct Handlers {
    pub api: Arc<dyn Transport>,
    pub store: MediaStore,
    pub faces: Arc<dyn FaceDetector>,
    pub audio: Arc<dyn AudioConverter>,
}

/// Where a reply goes: the chat (which is also the storage owner) and the message answered.
#[derive(Debug, Clone, Copy)]
pub struct ReplyTarget {
    pub chat_id: i64,
    pub message_id: i64,
}

impl Handlers {
    pub async fn reply(&self, target: ReplyTarget, text: &str) -> anyhow::Result<()> {
        self.api
            .send_message(target.chat_id, text, Some(target.message_id))
            .await
    }
}

/// Temporary downloads are best-effort cleaned up; a leftover file is only logged.
async fn remove_temp(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove temporary file {}: {}", path.display(), e);
    }
}

/// Drop whatever a failed write left behind so it does not take up a sequence index.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", path.display(), e),
    }
}
