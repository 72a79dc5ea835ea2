//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] over a
//! temporary directory with fake tools in place of ffmpeg and the SILK
//! encoder. The [`TestHarness::with_server`] constructor starts the server on
//! a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use sc_av::{Converter, Encoder, ToolRegistry, Transcoder};
use sc_core::config::Config;
use sc_core::Platform;
use sc_server::AppContext;

/// Uploads whose content starts with this marker fail to transcode.
pub const CORRUPT_MARKER: &[u8] = b"corrupt";

/// Stand-in for ffmpeg: writes 20 ms of silence per call.
#[derive(Default)]
pub struct FakeTranscoder {
    calls: AtomicUsize,
}

impl FakeTranscoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn to_pcm(&self, input: &Path, output: &Path, sample_rate: u32) -> sc_core::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = tokio::fs::read(input).await?;
        if data.starts_with(CORRUPT_MARKER) {
            return Err(sc_core::Error::tool(
                "ffmpeg",
                "Invalid data found when processing input",
            ));
        }
        let samples = sample_rate as usize / 50;
        tokio::fs::write(output, vec![0u8; samples * 2]).await?;
        Ok(())
    }
}

/// Stand-in for the SILK encoder: a Tencent header followed by the PCM
/// length.
pub struct FakeEncoder;

#[async_trait]
impl Encoder for FakeEncoder {
    async fn encode(&self, pcm: &[u8], _sample_rate: u32) -> sc_core::Result<Vec<u8>> {
        sc_av::encoder::validate_pcm(pcm)?;
        let mut out = vec![sc_av::encoder::TENCENT_PREFIX];
        out.extend_from_slice(sc_av::encoder::SILK_V3_MAGIC);
        out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
        Ok(out)
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] rooted in a
/// temporary directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub transcoder: Arc<FakeTranscoder>,
    dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a new harness, letting the caller adjust the configuration.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = dir.path();

        let mut config = Config::default();
        config.upload.dir = Some(root.join("uploads"));
        config.watch.input_dir = Some(root.join("watch/input"));
        config.watch.output_dir = Some(root.join("watch/output"));
        adjust(&mut config);

        let transcoder = Arc::new(FakeTranscoder::default());
        let converter = Converter::new(transcoder.clone(), Arc::new(FakeEncoder));
        let ctx = AppContext::new(
            config,
            Platform::host(root),
            ToolRegistry::default(),
            converter,
        );

        Self {
            ctx,
            transcoder,
            dir,
        }
    }

    /// Start the server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start the server for this harness on a random port.
    pub async fn serve(self) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            sc_server::serve(listener, ctx, std::future::pending()).await.ok();
        });

        (self, addr)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.ctx.upload_dir.as_ref().clone()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.ctx.watch.input_dir().to_path_buf()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.ctx.watch.output_dir().to_path_buf()
    }
}

/// Number of entries in `dir`, treating a missing directory as empty.
pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Hand-built `multipart/form-data` body with one file part and optional
/// text parts. Returns the content type and the body.
pub fn multipart_body(
    file: Option<(&str, &str, &[u8])>,
    text: &[(&str, &str)],
) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "----silkconv-test-boundary";
    let mut body = Vec::new();

    for (name, value) in text {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((field, filename, data)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// 16-bit mono WAV with a 440 Hz tone.
pub fn sine_wav(path: &Path, seconds: u32, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("failed to create wav");
    for n in 0..seconds * sample_rate {
        let t = n as f32 / sample_rate as f32;
        let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .expect("failed to write sample");
    }
    writer.finalize().expect("failed to finalize wav");
}
