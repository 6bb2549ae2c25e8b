use anyhow::Result;
use tracing::info;

use crate::handlers::{audio, photo, Handlers, ReplyTarget};
use crate::media::faces::image_extension;
use crate::platform::types::Document;

pub const UNSUPPORTED_DOCUMENT: &str = "Unsupported document type.";

/// Route a file sent as a document by its MIME type. Only image formats the
/// detector can decode reach the photo pipeline.
pub async fn handle_document(
    handlers: &Handlers,
    target: ReplyTarget,
    document: &Document,
) -> Result<()> {
    let mime = document.mime_type.as_deref().unwrap_or_default();
    if let Some(extension) = image_extension(mime) {
        photo::handle_photo(handlers, target, &document.file_id, extension).await
    } else if mime.starts_with("audio/") {
        audio::handle_audio(handlers, target, &document.file_id).await
    } else {
        info!(
            "Ignoring document {:?} ({}) from {}",
            document.file_name, mime, target.chat_id
        );
        handlers.reply(target, UNSUPPORTED_DOCUMENT).await
    }
}
