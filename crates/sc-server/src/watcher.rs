//! Folder watch loop.
//!
//! Polls an input directory on a fixed interval and converts every
//! supported audio file it finds into `<output_dir>/<stem>.silk`, deleting
//! the source once conversion succeeds. Files are identified by name and
//! modification time so the same drop is never converted twice in one
//! session; a failed file is forgotten so the next tick retries it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use sc_av::{ConversionJob, Converter};
use sc_core::media;

/// Outcome counts for one scan of the input directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub converted: usize,
    pub failed: usize,
    /// Files already handled this session.
    pub skipped: usize,
}

#[derive(Default)]
struct RunState {
    cancel: Option<CancellationToken>,
    /// Handle of the current loop, or of a stopped loop that may still be
    /// finishing its last file.
    task: Option<JoinHandle<()>>,
}

/// Owner of the watch loop and its dedup set.
pub struct WatchController {
    scanner: Scanner,
    interval: Duration,
    state: Mutex<RunState>,
    /// Serialises `start` and `shutdown`, which await across the state lock.
    lifecycle: tokio::sync::Mutex<()>,
}

impl WatchController {
    pub fn new(
        input_dir: PathBuf,
        output_dir: PathBuf,
        interval: Duration,
        converter: Arc<Converter>,
    ) -> Self {
        Self {
            scanner: Scanner {
                input_dir: Arc::new(input_dir),
                output_dir: Arc::new(output_dir),
                converter,
                seen: Arc::new(Mutex::new(HashSet::new())),
            },
            interval,
            state: Mutex::new(RunState::default()),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.scanner.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.scanner.output_dir
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().cancel.is_some()
    }

    /// Start polling. Returns `Ok(false)` without side effects if the loop
    /// is already running.
    ///
    /// If a previously stopped loop is still finishing a file, waits for it
    /// before clearing the dedup set, so at most one loop ever runs.
    pub async fn start(&self) -> sc_core::Result<bool> {
        let _lifecycle = self.lifecycle.lock().await;

        let previous = {
            let mut state = self.state.lock();
            if state.cancel.is_some() {
                return Ok(false);
            }
            state.task.take()
        };
        if let Some(task) = previous {
            let _ = task.await;
        }

        tokio::fs::create_dir_all(self.input_dir()).await?;
        tokio::fs::create_dir_all(self.output_dir()).await?;
        self.scanner.seen.lock().clear();

        let cancel = CancellationToken::new();
        let scanner = self.scanner.clone();
        let interval = self.interval;
        let token = cancel.clone();
        {
            let mut state = self.state.lock();
            state.task = Some(tokio::spawn(async move {
                run_loop(scanner, interval, token).await;
            }));
            state.cancel = Some(cancel);
        }

        tracing::info!(
            input = %self.input_dir().display(),
            output = %self.output_dir().display(),
            interval_ms = interval.as_millis() as u64,
            "Watch started"
        );
        Ok(true)
    }

    /// Stop polling. Returns `false` if the loop was not running.
    ///
    /// No new file is picked up once this returns; a conversion already in
    /// progress runs to completion. The dedup set is kept until the next
    /// [`start`](Self::start).
    pub fn stop(&self) -> bool {
        let Some(cancel) = self.state.lock().cancel.take() else {
            return false;
        };
        cancel.cancel();
        tracing::info!("Watch stopped");
        true
    }

    /// Stop polling and wait for the loop to exit.
    pub async fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let task = {
            let mut state = self.state.lock();
            if let Some(cancel) = state.cancel.take() {
                cancel.cancel();
            }
            state.task.take()
        };
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Run one scan immediately, independent of the timer.
    pub async fn scan_once(&self) -> TickSummary {
        self.scanner.tick(&CancellationToken::new()).await
    }

    /// Number of keys currently in the dedup set.
    pub fn seen_count(&self) -> usize {
        self.scanner.seen.lock().len()
    }
}

async fn run_loop(scanner: Scanner, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // Processing happens inline, so a slow tick delays the next one
        // instead of overlapping it.
        let summary = scanner.tick(&cancel).await;
        if summary.converted + summary.failed > 0 {
            tracing::debug!(?summary, "Watch tick finished");
        }
    }

    tracing::debug!("Watch loop exited");
}

#[derive(Clone)]
struct Scanner {
    input_dir: Arc<PathBuf>,
    output_dir: Arc<PathBuf>,
    converter: Arc<Converter>,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl Scanner {
    /// Convert every new candidate, checking `cancel` between files.
    async fn tick(&self, cancel: &CancellationToken) -> TickSummary {
        let mut summary = TickSummary::default();

        let candidates = match list_candidates(&self.input_dir).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(dir = %self.input_dir.display(), "Watch scan failed: {e}");
                return summary;
            }
        };

        // Outputs written in this tick, so `a.mp3` and `a.wav` do not
        // overwrite each other.
        let mut claimed = HashSet::new();

        for (path, key) in candidates {
            if cancel.is_cancelled() {
                break;
            }

            // Record before converting so a slow job is not picked up again.
            if !self.seen.lock().insert(key.clone()) {
                summary.skipped += 1;
                continue;
            }

            let mut job = ConversionJob::for_watch(&path, &self.output_dir);
            if claimed.contains(&job.output) {
                job = job.with_extension_in_name();
                tracing::warn!(
                    source = %path.display(),
                    output = %job.output.display(),
                    "Output name already used this scan, keeping the extension"
                );
            }

            match self.converter.run(&job).await {
                Ok(report) => {
                    summary.converted += 1;
                    tracing::info!(
                        source = %path.display(),
                        output = %report.output.display(),
                        "Watch converted file"
                    );
                    claimed.insert(report.output);
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(source = %path.display(), "Failed to remove source: {e}");
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    self.seen.lock().remove(&key);
                    tracing::warn!(source = %path.display(), error = %e, "Watch conversion failed");
                }
            }
        }

        summary
    }
}

/// Supported audio files directly inside `dir`, sorted by name, each with
/// its dedup key. Symlinks are followed.
async fn list_candidates(dir: &Path) -> std::io::Result<Vec<(PathBuf, String)>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !media::is_supported_audio(&path) {
            continue;
        }
        let Ok(meta) = tokio::fs::metadata(&path).await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let key = format!("{}_{mtime_ms}", entry.file_name().to_string_lossy());
        found.push((path, key));
    }

    found.sort();
    Ok(found)
}
