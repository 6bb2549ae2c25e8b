use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub faces: FacesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    /// Inline token. When absent the token is read from `token_file`.
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// Server-side long-poll wait, in seconds.
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
    /// Where to persist the update cursor between restarts. In-memory only if unset.
    #[serde(default)]
    pub offset_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FacesConfig {
    /// SeetaFace frontal detection model.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_min_face_size")]
    pub min_face_size: u32,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

fn default_token_file() -> PathBuf {
    PathBuf::from("bot_token.txt")
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

fn default_image_dir() -> String {
    "images".to_string()
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("seeta_fd_frontal_v1.0.bin")
}

fn default_min_face_size() -> u32 {
    20
}

fn default_score_threshold() -> f64 {
    2.0
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            token_file: default_token_file(),
            api_url: default_api_url(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            offset_file: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            audio_dir: default_audio_dir(),
            image_dir: default_image_dir(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for FacesConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            min_face_size: default_min_face_size(),
            score_threshold: default_score_threshold(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)?;

        if !config.storage.root.exists() {
            std::fs::create_dir_all(&config.storage.root).with_context(|| {
                format!(
                    "Failed to create storage directory: {}",
                    config.storage.root.display()
                )
            })?;
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// The bot credential: the inline `bot_token`, or the first line of `token_file`.
    pub fn bot_token(&self) -> Result<String> {
        if let Some(token) = self.telegram.bot_token.as_deref() {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }

        let path = &self.telegram.token_file;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bot token file: {}", path.display()))?;
        let token = content.lines().next().unwrap_or_default().trim();
        if token.is_empty() {
            anyhow::bail!("Bot token file is empty: {}", path.display());
        }
        Ok(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.telegram.token_file, PathBuf::from("bot_token.txt"));
        assert_eq!(config.polling.timeout_secs, 30);
        assert!(config.polling.offset_file.is_none());
        assert_eq!(config.storage.audio_dir, "audio");
        assert_eq!(config.storage.image_dir, "images");
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.faces.min_face_size, 20);
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let config = Config::parse(
            r#"
            [polling]
            offset_file = "offset.txt"

            [storage]
            root = "/srv/bot"
            "#,
        )
        .unwrap();
        assert_eq!(config.polling.timeout_secs, 30);
        assert_eq!(
            config.polling.offset_file,
            Some(PathBuf::from("offset.txt"))
        );
        assert_eq!(config.storage.root, PathBuf::from("/srv/bot"));
        assert_eq!(config.storage.image_dir, "images");
    }

    #[test]
    fn test_inline_token_wins() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = " 123:abc "
            token_file = "/nonexistent/token.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.bot_token().unwrap(), "123:abc");
    }

    #[test]
    fn test_token_read_from_first_line_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("bot_token.txt");
        std::fs::write(&token_path, "456:def\nsecond line\n").unwrap();

        let mut config = Config::parse("").unwrap();
        config.telegram.token_file = token_path;
        assert_eq!(config.bot_token().unwrap(), "456:def");
    }

    #[test]
    fn test_empty_token_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("bot_token.txt");
        std::fs::write(&token_path, "\n").unwrap();

        let mut config = Config::parse("").unwrap();
        config.telegram.token_file = token_path;
        assert!(config.bot_token().is_err());
    }
}
