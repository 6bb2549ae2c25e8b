use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::platform::types::Update;
use crate::platform::Transport;

/// Long-polls `getUpdates`, keeping the cursor one past the last update seen.
pub struct Poller {
    offset: Option<i64>,
    timeout_secs: u64,
    offset_file: Option<PathBuf>,
}

impl Poller {
    /// Without an `offset_file` the cursor lives in memory and restarts from the server default.
    pub fn new(timeout_secs: u64, offset_file: Option<PathBuf>) -> Result<Self> {
        let offset = match &offset_file {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read offset file: {}", path.display()))?;
                let offset = content.trim().parse::<i64>().with_context(|| {
                    format!("Invalid offset in {}: {:?}", path.display(), content.trim())
                })?;
                Some(offset)
            }
            _ => None,
        };

        Ok(Self {
            offset,
            timeout_secs,
            offset_file,
        })
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetch the next batch. The cursor moves past every returned update before
    /// any of them is handled.
    pub async fn poll(&mut self, api: &dyn Transport) -> Result<Vec<Update>> {
        let updates = api.get_updates(self.offset, self.timeout_secs).await?;

        for update in &updates {
            self.advance(update.update_id);
        }

        if !updates.is_empty() {
            debug!(
                "Received {} update(s), next offset {:?}",
                updates.len(),
                self.offset
            );
            self.persist().await?;
        }

        Ok(updates)
    }

    // Never moves backwards, even if the server replays an older id.
    fn advance(&mut self, update_id: i64) {
        let next = update_id + 1;
        if self.offset.map_or(true, |current| next > current) {
            self.offset = Some(next);
        }
    }

    async fn persist(&self) -> Result<()> {
        let (Some(path), Some(offset)) = (&self.offset_file, self.offset) else {
            return Ok(());
        };
        tokio::fs::write(path, offset.to_string())
            .await
            .with_context(|| format!("Failed to write offset file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::FakeTransport;
    use serde_json::json;

    fn update(id: i64) -> Update {
        serde_json::from_value(json!({
            "update_id": id,
            "message": { "message_id": id, "chat": { "id": 1 }, "text": "hi" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_cursor_advances_past_last_update() {
        let api = FakeTransport::default();
        *api.batches.lock().unwrap() = vec![vec![update(100), update(101), update(103)]];
        let mut poller = Poller::new(30, None).unwrap();

        let batch = poller.poll(&api).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(poller.offset(), Some(104));

        // Next poll asks for the advanced cursor.
        poller.poll(&api).await.unwrap();
        assert_eq!(*api.offsets.lock().unwrap(), vec![None, Some(104)]);
    }

    #[tokio::test]
    async fn test_empty_batch_keeps_cursor() {
        let api = FakeTransport::default();
        *api.batches.lock().unwrap() = vec![vec![update(7)], vec![]];
        let mut poller = Poller::new(30, None).unwrap();

        poller.poll(&api).await.unwrap();
        poller.poll(&api).await.unwrap();
        assert_eq!(poller.offset(), Some(8));
    }

    #[tokio::test]
    async fn test_cursor_never_decreases() {
        let api = FakeTransport::default();
        *api.batches.lock().unwrap() = vec![vec![update(50)], vec![update(10)]];
        let mut poller = Poller::new(30, None).unwrap();

        poller.poll(&api).await.unwrap();
        poller.poll(&api).await.unwrap();
        assert_eq!(poller.offset(), Some(51));
    }

    #[tokio::test]
    async fn test_offset_file_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let offset_file = dir.path().join("offset.txt");

        let api = FakeTransport::default();
        *api.batches.lock().unwrap() = vec![vec![update(20), update(21)]];
        let mut poller = Poller::new(30, Some(offset_file.clone())).unwrap();
        assert_eq!(poller.offset(), None);
        poller.poll(&api).await.unwrap();
        assert_eq!(std::fs::read_to_string(&offset_file).unwrap(), "22");

        let restarted = Poller::new(30, Some(offset_file)).unwrap();
        assert_eq!(restarted.offset(), Some(22));
    }

    #[test]
    fn test_corrupt_offset_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let offset_file = dir.path().join("offset.txt");
        std::fs::write(&offset_file, "not a number").unwrap();
        assert!(Poller::new(30, Some(offset_file)).is_err());
    }
}
