//! SILK v3 encoding of raw PCM.
//!
//! The encoder itself is the SILK SDK command-line encoder. [`SilkEncoder`]
//! feeds it PCM through a private scratch directory and reads the bitstream
//! back, so callers only ever see bytes in and bytes out.

use async_trait::async_trait;
use tempfile::TempDir;

use crate::command::ToolCommand;
use crate::tools::{ToolConfig, ToolRegistry, SILK_ENCODER};

/// Magic that opens every SILK v3 stream.
pub const SILK_V3_MAGIC: &[u8] = b"#!SILK_V3";

/// Leading byte of the Tencent (QQ/WeChat) flavour of the stream.
pub const TENCENT_PREFIX: u8 = 0x02;

/// Compresses PCM into an encoded bitstream.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encode mono s16le `pcm` sampled at `sample_rate`.
    async fn encode(&self, pcm: &[u8], sample_rate: u32) -> sc_core::Result<Vec<u8>>;
}

/// Whether `bytes` start with a SILK v3 header, with or without the Tencent
/// prefix byte.
pub fn is_silk_stream(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(&TENCENT_PREFIX) => bytes[1..].starts_with(SILK_V3_MAGIC),
        Some(_) => bytes.starts_with(SILK_V3_MAGIC),
        None => false,
    }
}

/// Reject PCM the encoder cannot make sense of.
pub fn validate_pcm(pcm: &[u8]) -> sc_core::Result<()> {
    if pcm.is_empty() {
        return Err(sc_core::Error::Validation("PCM input is empty".into()));
    }
    if pcm.len() % 2 != 0 {
        return Err(sc_core::Error::Validation(format!(
            "PCM input has {} bytes, not a whole number of 16-bit samples",
            pcm.len()
        )));
    }
    Ok(())
}

/// [`Encoder`] backed by the SILK SDK encoder CLI.
#[derive(Debug, Clone)]
pub struct SilkEncoder {
    tool: ToolConfig,
    bit_rate: u32,
    tencent: bool,
}

impl SilkEncoder {
    pub fn new(tool: ToolConfig, bit_rate: u32, tencent: bool) -> Self {
        Self {
            tool,
            bit_rate,
            tencent,
        }
    }

    /// Build from a registry and the `[encoder]` config section.
    pub fn from_registry(
        tools: &ToolRegistry,
        config: &sc_core::config::EncoderConfig,
    ) -> sc_core::Result<Self> {
        let tool = tools.require(SILK_ENCODER)?.clone();
        Ok(Self::new(tool, config.bit_rate, config.tencent))
    }

    /// The encoder invocation for one PCM file.
    pub fn command(&self, pcm: &str, out: &str, sample_rate: u32) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.tool.path.clone());
        cmd.timeout(self.tool.timeout);
        cmd.args([pcm, out]);
        cmd.args(["-Fs_API", &sample_rate.to_string()]);
        cmd.args(["-rate", &self.bit_rate.to_string()]);
        if self.tencent {
            cmd.arg("-tencent");
        }
        cmd.arg("-quiet");
        cmd
    }
}

#[async_trait]
impl Encoder for SilkEncoder {
    async fn encode(&self, pcm: &[u8], sample_rate: u32) -> sc_core::Result<Vec<u8>> {
        validate_pcm(pcm)?;

        let scratch = TempDir::new().map_err(|e| {
            sc_core::Error::tool(SILK_ENCODER, format!("failed to create temp dir: {e}"))
        })?;
        let pcm_path = scratch.path().join("input.pcm");
        let out_path = scratch.path().join("output.silk");

        tokio::fs::write(&pcm_path, pcm).await?;

        self.command(
            &pcm_path.to_string_lossy(),
            &out_path.to_string_lossy(),
            sample_rate,
        )
        .execute()
        .await?;

        let encoded = tokio::fs::read(&out_path).await.map_err(|e| {
            sc_core::Error::tool(SILK_ENCODER, format!("no output produced: {e}"))
        })?;

        if !is_silk_stream(&encoded) {
            return Err(sc_core::Error::tool(
                SILK_ENCODER,
                "output is not a SILK v3 stream",
            ));
        }

        tracing::debug!(
            pcm_bytes = pcm.len(),
            encoded_bytes = encoded.len(),
            bit_rate = self.bit_rate,
            "encoded silk"
        );

        Ok(encoded)
    }
}
