use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::config::AudioConfig;
use crate::media::AudioConverter;

/// Converts audio to mono WAV at a fixed sample rate by running `ffmpeg`.
pub struct FfmpegConverter {
    binary: PathBuf,
    sample_rate: u32,
}

impl FfmpegConverter {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            binary: config.ffmpeg.clone(),
            sample_rate: config.sample_rate,
        }
    }

    fn command(&self, input: &Path, output: &Path) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.binary);
        command
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-ac", "1", "-ar"])
            .arg(self.sample_rate.to_string())
            .arg(output);
        command
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        debug!(
            "Converting {} to {} Hz WAV at {}",
            input.display(),
            self.sample_rate,
            output.display()
        );

        let result = self
            .command(input, output)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.binary.display()))?;

        if !result.status.success() {
            anyhow::bail!(
                "Audio conversion failed (exit code {}): {}",
                result.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }
        Ok(())
    }
}
