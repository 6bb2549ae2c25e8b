use anyhow::Result;
use tracing::{debug, info};

use crate::handlers::{audio, command, document, photo, Handlers, ReplyTarget};
use crate::platform::types::{Payload, Update};
use crate::storage::MediaKind;

/// Route one update to the handler for its payload. Updates with no message
/// or an unrecognised payload are dropped.
pub async fn dispatch(handlers: &Handlers, update: &Update) -> Result<()> {
    let Some(message) = &update.message else {
        debug!("Ignoring update {} without a message", update.update_id);
        return Ok(());
    };
    let Some(payload) = message.payload() else {
        debug!("Ignoring update {} with unsupported content", update.update_id);
        return Ok(());
    };

    let target = ReplyTarget {
        chat_id: message.chat.id,
        message_id: message.message_id,
    };
    let sender = message
        .from
        .as_ref()
        .and_then(|user| user.username.as_deref())
        .unwrap_or("unknown");

    match payload {
        Payload::Text(text) => {
            info!(
                "[{}] From {} (@{}): {}",
                message.message_id, target.chat_id, sender, text
            );
            command::handle_text(handlers, target, text).await
        }
        Payload::Document(doc) => {
            info!(
                "[{}] Document from {} (@{}): {:?}",
                message.message_id, target.chat_id, sender, doc.file_name
            );
            document::handle_document(handlers, target, doc).await
        }
        Payload::Voice(voice) => {
            info!(
                "[{}] Voice from {} (@{}): {}s",
                message.message_id, target.chat_id, sender, voice.duration
            );
            audio::handle_audio(handlers, target, &voice.file_id).await
        }
        Payload::Photo(size) => {
            info!(
                "[{}] Photo from {} (@{}): {}x{}",
                message.message_id, target.chat_id, sender, size.width, size.height
            );
            photo::handle_photo(
                handlers,
                target,
                &size.file_id,
                MediaKind::Image.default_extension(),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{entries, handlers, Sent};
    use serde_json::json;

    fn update(body: serde_json::Value) -> Update {
        let mut message = json!({ "message_id": 9, "chat": { "id": 42 } });
        message
            .as_object_mut()
            .unwrap()
            .extend(body.as_object().unwrap().clone());
        serde_json::from_value(json!({ "update_id": 1, "message": message })).unwrap()
    }

    #[tokio::test]
    async fn test_help_text_update() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 0);

        dispatch(&handlers, &update(json!({ "text": "/help" })))
            .await
            .unwrap();

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Sent::Message { text, reply_to, .. } => {
                assert!(text.contains("/help"));
                assert!(text.contains("/list"));
                assert!(text.contains("/send"));
                assert_eq!(*reply_to, Some(9));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_photo_update_with_face() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 1);
        let body = json!({
            "photo": [
                { "file_id": "thumb", "width": 90, "height": 90 },
                { "file_id": "full", "width": 800, "height": 600 }
            ]
        });

        dispatch(&handlers, &update(body)).await.unwrap();

        let user_dir = dir.path().join("images/42");
        assert_eq!(entries(&user_dir), vec!["0.jpg"]);
        assert_eq!(std::fs::read(user_dir.join("0.jpg")).unwrap(), b"full");
        assert_eq!(api.texts(), vec!["Face detected, saved as 0.jpg"]);
    }

    #[tokio::test]
    async fn test_photo_update_without_face() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 0);
        let body = json!({ "photo": [{ "file_id": "p", "width": 10, "height": 10 }] });

        dispatch(&handlers, &update(body)).await.unwrap();

        assert!(entries(&dir.path().join("images/42")).is_empty());
        assert_eq!(api.texts(), vec![photo::FACE_NOT_FOUND]);
    }

    #[tokio::test]
    async fn test_voice_update() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 0);
        let body = json!({ "voice": { "file_id": "v", "duration": 3, "mime_type": "audio/ogg" } });

        dispatch(&handlers, &update(body)).await.unwrap();

        assert_eq!(entries(&dir.path().join("audio/42")), vec!["0.wav"]);
        assert_eq!(api.texts(), vec!["Audio saved as 0.wav"]);
    }

    #[tokio::test]
    async fn test_unknown_updates_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (handlers, api) = handlers(dir.path(), 1);

        let no_message: Update = serde_json::from_value(json!({ "update_id": 2 })).unwrap();
        dispatch(&handlers, &no_message).await.unwrap();
        dispatch(&handlers, &update(json!({ "sticker": { "file_id": "s" } })))
            .await
            .unwrap();

        assert!(api.sent().is_empty());
    }
}
