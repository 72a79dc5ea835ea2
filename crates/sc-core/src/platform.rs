//! Runtime platform detection.
//!
//! The service runs either on a regular host or inside Termux on Android.
//! The two differ in where ffmpeg lives and where the watch folders default
//! to, so the detected [`Platform`] is threaded through configuration and
//! tool discovery instead of being re-probed ad hoc.

use std::path::{Path, PathBuf};

/// Marker directory that only exists inside a Termux installation.
pub const TERMUX_ROOT: &str = "/data/data/com.termux";

/// ffmpeg as installed by `pkg install ffmpeg` inside Termux.
pub const TERMUX_FFMPEG: &str = "/data/data/com.termux/files/usr/bin/ffmpeg";

/// Shared storage root visible to Android apps when running under Termux.
const TERMUX_SHARED_DIR: &str = "/storage/emulated/0/SilkConverter";

/// Where the process is running and what it should treat as its base dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// True when running inside Termux.
    pub termux: bool,
    /// Directory that relative defaults (uploads, watch folders) hang off.
    pub base_dir: PathBuf,
}

impl Platform {
    /// Probe the real environment.
    pub fn detect() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            termux: Path::new(TERMUX_ROOT).exists(),
            base_dir,
        }
    }

    /// A non-Termux platform rooted at `base_dir`.
    pub fn host(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            termux: false,
            base_dir: base_dir.into(),
        }
    }

    /// Default watch input directory.
    pub fn default_watch_input(&self) -> PathBuf {
        if self.termux {
            PathBuf::from(TERMUX_SHARED_DIR).join("input")
        } else {
            self.base_dir.join("watch").join("input")
        }
    }

    /// Default watch output directory.
    pub fn default_watch_output(&self) -> PathBuf {
        if self.termux {
            PathBuf::from(TERMUX_SHARED_DIR).join("output")
        } else {
            self.base_dir.join("watch").join("output")
        }
    }

    /// Default directory for HTTP uploads and their intermediates.
    pub fn default_upload_dir(&self) -> PathBuf {
        self.base_dir.join("uploads")
    }
}
