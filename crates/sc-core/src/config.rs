//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, uploads, the watch folder, external tools, and
//! the SILK encoder. Every section defaults sensibly so a completely empty
//! `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::platform::Platform;
use crate::Error;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 9527;

/// Default upload cap: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Default watch polling interval.
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 2000;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub watch: WatchConfig,
    pub tools: ToolsConfig,
    pub encoder: EncoderConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply overrides from the process environment (`PORT`).
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value {raw:?}"),
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.upload.max_bytes == 0 {
            warnings.push("upload.max_bytes is 0; every upload will be rejected".into());
        }

        if self.watch.interval_ms < 100 {
            warnings.push(format!(
                "watch.interval_ms is {}; polling faster than 100ms only burns CPU",
                self.watch.interval_ms
            ));
        }

        if let (Some(input), Some(output)) = (&self.watch.input_dir, &self.watch.output_dir) {
            if input == output {
                warnings.push(
                    "watch.input_dir and watch.output_dir are the same directory".into(),
                );
            }
        }

        if !(5_000..=100_000).contains(&self.encoder.bit_rate) {
            warnings.push(format!(
                "encoder.bit_rate {} is outside the SILK range 5000-100000",
                self.encoder.bit_rate
            ));
        }

        for (name, path) in [
            ("tools.ffmpeg_path", &self.tools.ffmpeg_path),
            ("tools.encoder_path", &self.tools.encoder_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        warnings
    }

    /// Watch input directory, resolved against the platform defaults.
    pub fn watch_input_dir(&self, platform: &Platform) -> PathBuf {
        self.watch
            .input_dir
            .clone()
            .unwrap_or_else(|| platform.default_watch_input())
    }

    /// Watch output directory, resolved against the platform defaults.
    pub fn watch_output_dir(&self, platform: &Platform) -> PathBuf {
        self.watch
            .output_dir
            .clone()
            .unwrap_or_else(|| platform.default_watch_output())
    }

    /// Upload directory, resolved against the platform defaults.
    pub fn upload_dir(&self, platform: &Platform) -> PathBuf {
        self.upload
            .dir
            .clone()
            .unwrap_or_else(|| platform.default_upload_dir())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
        }
    }
}

/// Upload handling for `POST /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Where uploads and their intermediates are written. `None` means
    /// `<base dir>/uploads`.
    pub dir: Option<PathBuf>,
    /// Maximum accepted file size in bytes.
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Folder watch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Start the watch loop at boot.
    pub enabled: bool,
    /// `None` means the platform default.
    pub input_dir: Option<PathBuf>,
    /// `None` means the platform default.
    pub output_dir: Option<PathBuf>,
    pub interval_ms: u64,
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            input_dir: None,
            output_dir: None,
            interval_ms: DEFAULT_WATCH_INTERVAL_MS,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub encoder_path: Option<PathBuf>,
    /// Kill a tool after this many seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// SILK encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Target bit rate in bits per second.
    pub bit_rate: u32,
    /// Emit the `0x02` header byte QQ and WeChat expect.
    pub tencent: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bit_rate: 24_000,
            tencent: true,
        }
    }
}
