use anyhow::{Context, Result};
use tracing::info;

use crate::dispatcher;
use crate::handlers::Handlers;
use crate::poller::Poller;

/// The long-lived client: the update cursor plus everything handlers need.
pub struct Bot {
    poller: Poller,
    handlers: Handlers,
}

impl Bot {
    pub fn new(poller: Poller, handlers: Handlers) -> Self {
        Self { poller, handlers }
    }

    /// Poll once and handle the batch in order. Returns the number of updates seen.
    ///
    /// A handler error aborts the rest of the batch; the cursor has already
    /// moved past it, so those updates are not redelivered.
    pub async fn run_once(&mut self) -> Result<usize> {
        let updates = self.poller.poll(self.handlers.api.as_ref()).await?;
        for update in &updates {
            dispatcher::dispatch(&self.handlers, update)
                .await
                .with_context(|| format!("Failed to handle update {}", update.update_id))?;
        }
        Ok(updates.len())
    }
}

/// Poll and dispatch until Ctrl-C.
pub async fn run(mut bot: Bot) -> Result<()> {
    info!("Polling for updates...");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, shutting down");
                return Ok(());
            }
            handled = bot.run_once() => {
                handled?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::handlers;
    use crate::platform::types::Update;
    use serde_json::json;

    fn text_update(id: i64, text: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": id,
            "message": { "message_id": id, "chat": { "id": 42 }, "text": text }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_once_handles_whole_batch_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 0);
        *api.batches.lock().unwrap() = vec![vec![
            text_update(5, "/list"),
            text_update(6, "/send 3.wav"),
        ]];
        let mut bot = Bot::new(Poller::new(30, None).unwrap(), handlers);

        assert_eq!(bot.run_once().await.unwrap(), 2);
        assert_eq!(bot.poller.offset(), Some(7));
        assert_eq!(
            api.texts(),
            vec!["You have no saved files.", "File 3.wav does not exist."]
        );

        assert_eq!(bot.run_once().await.unwrap(), 0);
        assert_eq!(*api.offsets.lock().unwrap(), vec![None, Some(7)]);
    }
}
