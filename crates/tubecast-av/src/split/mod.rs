//! Size-bounded audio splitting.
//!
//! [`Splitter::split_if_needed`] decides from the file's byte size whether it
//! must be split, plans uniform time ranges with [`SegmentPlan`], and
//! transcodes each range to its own file in index order. Problems that stop a
//! split never fail the request: the original file is handed back inside
//! [`SplitOutcome::Unsplit`] together with the reason.

mod plan;

pub use plan::{part_count, Segment, SegmentPlan};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::probe::DurationProber;
use crate::transcode::{AudioEncoding, Transcoder};
use crate::{Error, Result};

/// Telegram bots may upload at most 50 MB; stay comfortably under it.
pub const DEFAULT_MAX_PART_BYTES: u64 = 45 * 1024 * 1024;

/// Parameters for splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSettings {
    /// Size ceiling for a single deliverable file, in bytes.
    pub max_part_bytes: u64,
    /// Encoder settings for output parts.
    pub encoding: AudioEncoding,
    /// Extension applied to output part names.
    pub extension: String,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            max_part_bytes: DEFAULT_MAX_PART_BYTES,
            encoding: AudioEncoding::default(),
            extension: "mp3".into(),
        }
    }
}

/// One produced output file and the range of the source it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPart {
    pub path: PathBuf,
    pub segment: Segment,
}

/// Why a file was returned without being split.
#[derive(Debug, Clone, PartialEq)]
pub enum UnsplitReason {
    /// The file already fits under the ceiling.
    WithinCeiling,
    /// The duration probe failed or reported zero.
    UnknownDuration,
    /// A transcode failed; partial output was removed.
    TranscodeFailed { part: usize, message: String },
}

/// Result of [`Splitter::split_if_needed`].
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// The original was replaced by these parts, in index order.
    Split { parts: Vec<SplitPart> },
    /// The original file is returned unchanged.
    Unsplit { path: PathBuf, reason: UnsplitReason },
}

impl SplitOutcome {
    /// The files to deliver, in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            SplitOutcome::Split { parts } => parts.iter().map(|p| p.path.clone()).collect(),
            SplitOutcome::Unsplit { path, .. } => vec![path.clone()],
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            SplitOutcome::Split { parts } => parts.len(),
            SplitOutcome::Unsplit { .. } => 1,
        }
    }

    /// Whether the outcome is a degraded fallback rather than the expected
    /// result for the input.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            SplitOutcome::Unsplit {
                reason: UnsplitReason::UnknownDuration | UnsplitReason::TranscodeFailed { .. },
                ..
            }
        )
    }
}

/// Path of output part `number` (1-based): the input path without its
/// extension, suffixed with `_part{number}`, with `extension` reapplied.
pub fn part_path(input: &Path, number: usize, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_part{number}.{extension}"))
}

/// Plans and performs size-bounded splits.
#[derive(Clone)]
pub struct Splitter {
    prober: Arc<dyn DurationProber>,
    transcoder: Arc<dyn Transcoder>,
    settings: SplitSettings,
}

impl std::fmt::Debug for Splitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Splitter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Splitter {
    /// Create a splitter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the size ceiling is zero.
    pub fn new(
        prober: Arc<dyn DurationProber>,
        transcoder: Arc<dyn Transcoder>,
        settings: SplitSettings,
    ) -> Result<Self> {
        if settings.max_part_bytes == 0 {
            return Err(Error::InvalidInput("max_part_bytes must be positive".into()));
        }
        Ok(Self {
            prober,
            transcoder,
            settings,
        })
    }

    pub fn settings(&self) -> &SplitSettings {
        &self.settings
    }

    /// Split `path` into parts that each fit under the ceiling, if needed.
    ///
    /// Parts are produced strictly one after another. On success the
    /// original is deleted and ownership of the parts passes to the caller.
    ///
    /// # Errors
    ///
    /// Only if the size of `path` cannot be read.
    pub async fn split_if_needed(&self, path: &Path) -> Result<SplitOutcome> {
        let size = tokio::fs::metadata(path).await?.len();
        let ceiling = self.settings.max_part_bytes;

        if size <= ceiling {
            return Ok(SplitOutcome::Unsplit {
                path: path.to_path_buf(),
                reason: UnsplitReason::WithinCeiling,
            });
        }

        let duration = self.prober.probe_duration(path).await;
        if duration <= 0.0 {
            tracing::warn!(
                "{} is {size} bytes (ceiling {ceiling}) but has no usable duration; delivering unsplit",
                path.display()
            );
            return Ok(SplitOutcome::Unsplit {
                path: path.to_path_buf(),
                reason: UnsplitReason::UnknownDuration,
            });
        }

        let plan = SegmentPlan::new(size, ceiling, duration);
        tracing::info!(
            "splitting {} ({size} bytes, {duration:.3}s) into {} parts of {:.3}s",
            path.display(),
            plan.len(),
            plan.part_duration()
        );

        let mut parts: Vec<SplitPart> = Vec::with_capacity(plan.len());
        for segment in plan.segments() {
            let output = part_path(path, segment.number(), &self.settings.extension);

            if let Err(e) = self
                .transcoder
                .transcode(path, &output, segment, &self.settings.encoding)
                .await
            {
                tracing::warn!(
                    "part {}/{} of {} failed: {e}; delivering unsplit",
                    segment.number(),
                    plan.len(),
                    path.display()
                );
                discard_partial_output(parts.iter().map(|p| p.path.as_path()).chain([output.as_path()]))
                    .await;
                return Ok(SplitOutcome::Unsplit {
                    path: path.to_path_buf(),
                    reason: UnsplitReason::TranscodeFailed {
                        part: segment.number(),
                        message: e.to_string(),
                    },
                });
            }

            parts.push(SplitPart {
                path: output,
                segment: *segment,
            });
        }

        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("failed to remove split original {}: {e}", path.display());
        }

        Ok(SplitOutcome::Split { parts })
    }
}

async fn discard_partial_output<'a>(paths: impl Iterator<Item = &'a Path>) {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!("removed partial output {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to remove partial output {}: {e}", path.display()),
        }
    }
}
