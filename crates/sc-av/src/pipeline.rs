//! Single-file conversion: audio → PCM → SILK.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::encoder::{Encoder, SilkEncoder};
use crate::job::{remove_quietly, ConversionJob};
use crate::tools::ToolRegistry;
use crate::transcode::{FfmpegTranscoder, Transcoder};

/// Sample rate every input is resampled to before encoding.
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Summary of a finished conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub pcm_bytes: u64,
    pub encoded_bytes: u64,
    pub duration_ms: u64,
}

/// Runs conversions one at a time.
///
/// A single `Converter` is shared by the HTTP endpoint and the watch loop;
/// its internal gate makes every caller wait for the job in flight.
pub struct Converter {
    transcoder: Arc<dyn Transcoder>,
    encoder: Arc<dyn Encoder>,
    gate: Mutex<()>,
}

impl Converter {
    pub fn new(transcoder: Arc<dyn Transcoder>, encoder: Arc<dyn Encoder>) -> Self {
        Self {
            transcoder,
            encoder,
            gate: Mutex::new(()),
        }
    }

    /// Converter using ffmpeg and the SILK SDK encoder from `tools`.
    pub fn from_tools(
        tools: &ToolRegistry,
        encoder: &sc_core::config::EncoderConfig,
    ) -> sc_core::Result<Self> {
        let transcoder = FfmpegTranscoder::from_registry(tools)?;
        let encoder = SilkEncoder::from_registry(tools, encoder)?;
        Ok(Self::new(Arc::new(transcoder), Arc::new(encoder)))
    }

    /// Convert `input` into a SILK file at `output`.
    ///
    /// The intermediate PCM file is written next to `output` and is gone by
    /// the time this returns, whatever the outcome.
    pub async fn convert_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> sc_core::Result<ConversionReport> {
        self.run(&ConversionJob::new(input.to_path_buf(), output.to_path_buf()))
            .await
    }

    /// Run a prepared job.
    pub async fn run(&self, job: &ConversionJob) -> sc_core::Result<ConversionReport> {
        let _slot = self.gate.lock().await;
        let started = Instant::now();

        let result = self.stages(job).await;
        remove_quietly(&job.pcm);

        let (pcm_bytes, encoded_bytes) = result?;
        let report = ConversionReport {
            output: job.output.clone(),
            pcm_bytes,
            encoded_bytes,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            source = %job.source.display(),
            output = %report.output.display(),
            pcm_bytes = report.pcm_bytes,
            encoded_bytes = report.encoded_bytes,
            duration_ms = report.duration_ms,
            "conversion complete"
        );

        Ok(report)
    }

    async fn stages(&self, job: &ConversionJob) -> sc_core::Result<(u64, u64)> {
        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.transcoder
            .to_pcm(&job.source, &job.pcm, job.sample_rate)
            .await?;

        let pcm = tokio::fs::read(&job.pcm)
            .await
            .map_err(|e| sc_core::Error::pipeline("read pcm", e.to_string()))?;

        let encoded = self.encoder.encode(&pcm, job.sample_rate).await?;

        tokio::fs::write(&job.output, &encoded)
            .await
            .map_err(|e| sc_core::Error::pipeline("write output", e.to_string()))?;

        Ok((pcm.len() as u64, encoded.len() as u64))
    }
}
