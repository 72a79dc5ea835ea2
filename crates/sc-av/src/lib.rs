//! # sc-av
//!
//! External tool management and the audio → SILK conversion pipeline.
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg and the SILK
//!   encoder, honouring configured paths and the Termux layout.
//! - **Command execution** ([`ToolCommand`]) -- async builder with optional
//!   timeout for running external processes.
//! - **PCM conversion** ([`Transcoder`], [`FfmpegTranscoder`]).
//! - **SILK encoding** ([`Encoder`], [`SilkEncoder`]).
//! - **Pipeline** ([`Converter`]) -- transcode, encode, clean up, one job at
//!   a time.

pub mod command;
pub mod encoder;
pub mod job;
pub mod pipeline;
pub mod tools;
pub mod transcode;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use encoder::{is_silk_stream, Encoder, SilkEncoder};
pub use job::{CleanupGuard, ConversionJob};
pub use pipeline::{ConversionReport, Converter, PCM_SAMPLE_RATE};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use transcode::{FfmpegTranscoder, Transcoder};
