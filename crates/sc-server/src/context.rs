//! Application context shared by every handler.

use std::path::PathBuf;
use std::sync::Arc;

use sc_av::{Converter, ToolRegistry};
use sc_core::config::Config;
use sc_core::Platform;

use crate::watcher::WatchController;

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Where the process is running.
    pub platform: Arc<Platform>,
    /// External tool registry.
    pub tools: Arc<ToolRegistry>,
    /// The single conversion worker.
    pub converter: Arc<Converter>,
    /// Folder watch loop.
    pub watch: Arc<WatchController>,
    /// Resolved upload directory.
    pub upload_dir: Arc<PathBuf>,
}

impl AppContext {
    /// Assemble a context, resolving directories against the platform.
    pub fn new(
        config: Config,
        platform: Platform,
        tools: ToolRegistry,
        converter: Converter,
    ) -> Self {
        let converter = Arc::new(converter);
        let watch = WatchController::new(
            config.watch_input_dir(&platform),
            config.watch_output_dir(&platform),
            config.watch.interval(),
            converter.clone(),
        );
        let upload_dir = config.upload_dir(&platform);

        Self {
            config: Arc::new(config),
            platform: Arc::new(platform),
            tools: Arc::new(tools),
            converter,
            watch: Arc::new(watch),
            upload_dir: Arc::new(upload_dir),
        }
    }
}
