//! Conversion of arbitrary audio into raw PCM via ffmpeg.

use std::path::Path;

use async_trait::async_trait;

use crate::command::ToolCommand;
use crate::tools::{ToolConfig, ToolRegistry, FFMPEG};

/// Turns an audio file into headerless mono signed 16-bit little-endian PCM.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transcode `input` into raw PCM at `sample_rate`, written to `output`.
    ///
    /// Resolves once the external process has finished; nothing is read from
    /// `output` before then.
    async fn to_pcm(&self, input: &Path, output: &Path, sample_rate: u32) -> sc_core::Result<()>;
}

/// [`Transcoder`] backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    tool: ToolConfig,
}

impl FfmpegTranscoder {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    /// Build from a registry, failing if ffmpeg was not discovered.
    pub fn from_registry(tools: &ToolRegistry) -> sc_core::Result<Self> {
        tools.require(FFMPEG).cloned().map(Self::new)
    }

    /// The ffmpeg invocation for one conversion.
    pub fn command(&self, input: &Path, output: &Path, sample_rate: u32) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.tool.path.clone());
        cmd.timeout(self.tool.timeout);
        cmd.args(["-y", "-hide_banner", "-loglevel", "error", "-i"]);
        cmd.arg(input.to_string_lossy().as_ref());
        // Drop cover art and other video streams.
        cmd.arg("-vn");
        cmd.args(["-ar", &sample_rate.to_string()]);
        cmd.args(["-ac", "1"]);
        cmd.args(["-acodec", "pcm_s16le", "-f", "s16le"]);
        cmd.arg(output.to_string_lossy().as_ref());
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn to_pcm(&self, input: &Path, output: &Path, sample_rate: u32) -> sc_core::Result<()> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(sc_core::Error::not_found("input file", input.display()));
        }

        tracing::debug!(
            input = %input.display(),
            output = %output.display(),
            sample_rate,
            "transcoding to pcm_s16le"
        );

        self.command(input, output, sample_rate).execute().await?;
        Ok(())
    }
}
