//! Filesystem layout of a single conversion.
//!
//! A [`ConversionJob`] names the three files one conversion touches. Upload
//! jobs own all three and remove them through a [`CleanupGuard`]; watch jobs
//! keep their output and only lose the source once conversion succeeds.

use std::path::{Path, PathBuf};

use sc_core::media::SILK_EXTENSION;

use crate::pipeline::PCM_SAMPLE_RATE;

/// Paths and parameters of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Input audio file.
    pub source: PathBuf,
    /// Intermediate raw PCM file.
    pub pcm: PathBuf,
    /// Encoded SILK file.
    pub output: PathBuf,
    pub sample_rate: u32,
}

impl ConversionJob {
    /// Job for an uploaded file: everything lives in `upload_dir` under a
    /// fresh random name, so concurrent uploads never collide.
    pub fn for_upload(upload_dir: &Path, extension: &str) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let source = upload_dir.join(format!("{id}.{extension}"));
        let output = upload_dir.join(format!("{id}.{SILK_EXTENSION}"));
        Self::new(source, output)
    }

    /// Job for a file picked up from the watch input directory.
    pub fn for_watch(source: &Path, output_dir: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let output = output_dir.join(format!("{stem}.{SILK_EXTENSION}"));
        Self::new(source.to_path_buf(), output)
    }

    /// Same job writing `<stem>_<ext>.silk` instead, for when another source
    /// with the same stem already claimed `<stem>.silk`.
    pub fn with_extension_in_name(self) -> Self {
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let Some(ext) = self.source.extension() else {
            return self;
        };
        let name = format!("{stem}_{}.{SILK_EXTENSION}", ext.to_string_lossy());
        let output = self.output.with_file_name(name);
        Self::new(self.source, output)
    }

    /// Job with an explicit source and output; the PCM sits next to the
    /// output.
    pub fn new(source: PathBuf, output: PathBuf) -> Self {
        Self {
            pcm: output.with_extension("pcm"),
            source,
            output,
            sample_rate: PCM_SAMPLE_RATE,
        }
    }

    /// Guard removing every artifact of this job when dropped.
    pub fn cleanup_all(&self) -> CleanupGuard {
        CleanupGuard::new([self.source.clone(), self.pcm.clone(), self.output.clone()])
    }
}

/// Removes a set of files when dropped. Removal errors are ignored.
#[derive(Debug, Default)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Paths that will be removed.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            remove_quietly(path);
        }
    }
}

/// Best-effort file removal.
pub fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::trace!(path = %path.display(), "removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::debug!(path = %path.display(), "cleanup failed: {e}"),
    }
}
