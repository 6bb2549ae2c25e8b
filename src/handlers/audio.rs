use anyhow::Result;
use tracing::info;

use crate::handlers::{remove_partial, remove_temp, Handlers, ReplyTarget};
use crate::storage::MediaKind;

/// Download an audio message, convert it to WAV in the user's audio directory, and reply with its name.
pub async fn handle_audio(handlers: &Handlers, target: ReplyTarget, file_id: &str) -> Result<()> {
    let tmp = handlers
        .api
        .download(file_id, &handlers.store.tmp_dir())
        .await?;

    let stored = async {
        let (name, path) = handlers
            .store
            .next_path(
                MediaKind::Audio,
                target.chat_id,
                MediaKind::Audio.default_extension(),
            )
            .await?;
        if let Err(e) = handlers.audio.convert(&tmp, &path).await {
            remove_partial(&path).await;
            return Err(e);
        }
        info!("Stored audio from {} as {}", target.chat_id, path.display());
        anyhow::Ok(name)
    }
    .await;
    remove_temp(&tmp).await;

    let name = stored?;
    handlers
        .reply(target, &format!("Audio saved as {}", name))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{entries, handlers, FailingConverter};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_voice_is_converted_into_audio_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 0);
        let target = ReplyTarget {
            chat_id: 8,
            message_id: 1,
        };

        handle_audio(&handlers, target, "voice-a").await.unwrap();
        handle_audio(&handlers, target, "voice-b").await.unwrap();

        let user_dir = dir.path().join("audio/8");
        assert_eq!(entries(&user_dir), vec!["0.wav", "1.wav"]);
        assert_eq!(std::fs::read(user_dir.join("1.wav")).unwrap(), b"voice-b");
        assert_eq!(
            api.texts(),
            vec!["Audio saved as 0.wav", "Audio saved as 1.wav"]
        );
        assert!(entries(&handlers.store.tmp_dir()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_conversion_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut handlers, api) = handlers(dir.path(), 0);
        handlers.audio = Arc::new(FailingConverter);
        let target = ReplyTarget {
            chat_id: 8,
            message_id: 2,
        };

        let err = handle_audio(&handlers, target, "voice-c").await.unwrap_err();

        assert!(err.to_string().contains("Audio conversion failed"));
        assert!(entries(&dir.path().join("audio/8")).is_empty());
        assert!(entries(&handlers.store.tmp_dir()).is_empty());
        assert!(api.sent().is_empty());
    }
}
