//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the two
//! external programs the service depends on (ffmpeg and a SILK v3 encoder)
//! and provides lookup methods for the rest of the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sc_core::config::ToolsConfig;
use sc_core::platform::{self, Platform};

/// Logical name of the audio transcoder.
pub const FFMPEG: &str = "ffmpeg";

/// Logical name of the SILK encoder.
pub const SILK_ENCODER: &str = "silk-encoder";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[FFMPEG, SILK_ENCODER];

/// Executable names the SILK encoder ships under, in lookup order.
const SILK_ENCODER_BINARIES: &[&str] = &["silk_v3_encoder", "silk-v3-encoder", "silk_encoder"];

/// Configuration for a single external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Logical tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
    /// Maximum execution time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools, preferring configured paths, then platform locations,
    /// then `PATH`.
    ///
    /// A configured path that does not exist falls back to `PATH`. On Termux
    /// the packaged ffmpeg is used when present. Tools that are not found are
    /// omitted from the registry.
    pub fn discover(tools_config: &ToolsConfig, platform: &Platform) -> Self {
        let mut tools = HashMap::new();
        let timeout = tools_config.timeout();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                FFMPEG => tools_config.ffmpeg_path.as_deref(),
                SILK_ENCODER => tools_config.encoder_path.as_deref(),
                _ => None,
            };

            let resolved = custom_path
                .filter(|p| p.exists())
                .map(Path::to_path_buf)
                .or_else(|| platform_path(name, platform))
                .or_else(|| search_path(name));

            if let Some(path) = resolved {
                tools.insert(
                    name.to_string(),
                    ToolConfig {
                        name: name.to_string(),
                        path,
                        timeout,
                    },
                );
            }
        }

        Self { tools }
    }

    /// Build a registry from explicit entries, bypassing discovery.
    pub fn from_tools(entries: impl IntoIterator<Item = ToolConfig>) -> Self {
        Self {
            tools: entries
                .into_iter()
                .map(|cfg| (cfg.name.clone(), cfg))
                .collect(),
        }
    }

    /// Return a reference to the [`ToolConfig`] for the given tool, or an
    /// [`sc_core::Error::Tool`] if the tool was not found during discovery.
    pub fn require(&self, name: &str) -> sc_core::Result<&ToolConfig> {
        self.tools.get(name).ok_or_else(|| {
            sc_core::Error::tool(name, format!("{name} not found; is it installed and in PATH?"))
        })
    }

    /// Whether the named tool was discovered.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, &cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

fn platform_path(name: &str, platform: &Platform) -> Option<PathBuf> {
    if name == FFMPEG && platform.termux {
        let termux = Path::new(platform::TERMUX_FFMPEG);
        if termux.exists() {
            return Some(termux.to_path_buf());
        }
    }
    None
}

fn search_path(name: &str) -> Option<PathBuf> {
    match name {
        SILK_ENCODER => SILK_ENCODER_BINARIES
            .iter()
            .find_map(|bin| which::which(bin).ok()),
        other => which::which(other).ok(),
    }
}

/// Run `ffmpeg -version` and return the first line of stdout.
///
/// The SILK SDK encoder has no version flag, so it reports `None`.
fn detect_version(name: &str, path: &Path) -> Option<String> {
    if name != FFMPEG {
        return None;
    }

    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
