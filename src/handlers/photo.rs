use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::handlers::{remove_partial, remove_temp, Handlers, ReplyTarget};
use crate::storage::MediaKind;

pub const FACE_NOT_FOUND: &str = "Face not found.";

/// Download an image, keep it as `<n>.<extension>` only if it contains a face,
/// and tell the user which.
pub async fn handle_photo(
    handlers: &Handlers,
    target: ReplyTarget,
    file_id: &str,
    extension: &str,
) -> Result<()> {
    let tmp = handlers
        .api
        .download(file_id, &handlers.store.tmp_dir())
        .await?;

    let outcome = store_if_face(handlers, target.chat_id, &tmp, extension).await;
    remove_temp(&tmp).await;

    let reply = match outcome? {
        Some(name) => format!("Face detected, saved as {}", name),
        None => FACE_NOT_FOUND.to_string(),
    };
    handlers.reply(target, &reply).await
}

async fn store_if_face(
    handlers: &Handlers,
    user_id: i64,
    image: &Path,
    extension: &str,
) -> Result<Option<String>> {
    let detector = handlers.faces.clone();
    let input = image.to_path_buf();
    let faces = tokio::task::spawn_blocking(move || detector.detect(&input))
        .await
        .context("Face detection task failed")??;
    if faces == 0 {
        info!("No face found in photo from {}", user_id);
        return Ok(None);
    }

    let (name, path) = handlers
        .store
        .next_path(MediaKind::Image, user_id, extension)
        .await?;
    if let Err(e) = tokio::fs::copy(image, &path).await {
        remove_partial(&path).await;
        return Err(e).with_context(|| format!("Failed to store image: {}", path.display()));
    }

    info!(
        "Stored photo with {} face(s) from {} as {}",
        faces,
        user_id,
        path.display()
    );
    Ok(Some(name))
}
