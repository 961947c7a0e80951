//! Duration probing.
//!
//! Only the container-level duration is ever requested. A probe never fails:
//! anything that prevents a duration from being read is reported as `0.0`,
//! which the splitter treats as "do not split".

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::Result;

/// Default ffprobe timeout. Reading the format header is quick.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads the total playback duration of a media file.
#[async_trait]
pub trait DurationProber: Send + Sync {
    /// Duration in seconds, or `0.0` when it cannot be determined.
    async fn probe_duration(&self, path: &Path) -> f64;
}

/// A [`DurationProber`] backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self {
            ffprobe_path,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Create a prober from the registry's ffprobe entry.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        Ok(Self::new(tools.require("ffprobe")?.to_path_buf()))
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, path: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(self.timeout);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]);
        cmd.arg(path.to_string_lossy());
        cmd
    }
}

#[async_trait]
impl DurationProber for FfprobeProber {
    async fn probe_duration(&self, path: &Path) -> f64 {
        let output = match self.command(path).execute().await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("ffprobe failed for {}: {e}", path.display());
                return 0.0;
            }
        };

        match parse_duration(&output.stdout) {
            Some(secs) => secs,
            None => {
                tracing::warn!(
                    "ffprobe returned no usable duration for {}: {:?}",
                    path.display(),
                    output.stdout.trim()
                );
                0.0
            }
        }
    }
}

/// Parse the bare-number output of
/// `ffprobe -show_entries format=duration -of default=noprint_wrappers=1:nokey=1`.
///
/// ffprobe prints `N/A` for streams without a known duration.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    let secs: f64 = stdout.lines().map(str::trim).find(|l| !l.is_empty())?.parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}
