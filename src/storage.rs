use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::StorageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

impl MediaKind {
    /// Extension used when the source format does not decide it.
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Audio => "wav",
            MediaKind::Image => "jpg",
        }
    }
}

/// Per-user media directories laid out as `<root>/<kind>/<user_id>/<n>.<ext>`.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    audio_dir: String,
    image_dir: String,
}

impl MediaStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            audio_dir: config.audio_dir.clone(),
            image_dir: config.image_dir.clone(),
        }
    }

    /// Scratch space for downloads that are processed and then removed.
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn user_dir(&self, kind: MediaKind, user_id: i64) -> PathBuf {
        let kind_dir = match kind {
            MediaKind::Audio => &self.audio_dir,
            MediaKind::Image => &self.image_dir,
        };
        self.root.join(kind_dir).join(user_id.to_string())
    }

    /// Reserve the next sequential `<n>.<extension>` for `user_id`, creating the directory if needed.
    ///
    /// The index is the number of entries currently in the directory, so two
    /// writers racing on the same user would pick the same name.
    pub async fn next_path(
        &self,
        kind: MediaKind,
        user_id: i64,
        extension: &str,
    ) -> Result<(String, PathBuf)> {
        let dir = self.user_dir(kind, user_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directories: {}", dir.display()))?;

        let mut count = 0usize;
        let mut read_dir = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        while read_dir.next_entry().await?.is_some() {
            count += 1;
        }

        let name = format!("{}.{}", count, extension);
        let path = dir.join(&name);
        Ok((name, path))
    }

    /// File names stored for `user_id`, in sequential order. Missing directory means none.
    pub async fn list(&self, kind: MediaKind, user_id: i64) -> Result<Vec<String>> {
        let dir = self.user_dir(kind, user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort_by_key(|name| (sequence_index(name), name.clone()));
        Ok(names)
    }

    /// Locate `name` in the user's audio directory, then the image directory.
    pub fn find(&self, user_id: i64, name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(name) {
            return None;
        }
        [MediaKind::Audio, MediaKind::Image]
            .into_iter()
            .map(|kind| self.user_dir(kind, user_id).join(name))
            .find(|path| path.is_file())
    }
}

fn sequence_index(name: &str) -> Option<u64> {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse().ok())
}

/// A single normal path component: no separators, no `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
