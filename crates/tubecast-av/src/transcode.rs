//! Segment transcoding via ffmpeg.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::split::Segment;
use crate::tools::ToolRegistry;
use crate::Result;

/// Audio encoder settings applied to every output part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEncoding {
    /// ffmpeg encoder name, passed to `-acodec`.
    pub codec: String,
    /// Target bitrate, passed to `-b:a` (e.g. `192k`).
    pub bitrate: String,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".into(),
            bitrate: "192k".into(),
        }
    }
}

/// Materializes one time range of a media file as its own file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode `segment` of `input` into `output`, overwriting it if present.
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        segment: &Segment,
        encoding: &AudioEncoding,
    ) -> Result<()>;
}

/// A [`Transcoder`] backed by the `ffmpeg` CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a transcoder from the registry's ffmpeg entry.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        Ok(Self::new(tools.require("ffmpeg")?.to_path_buf()))
    }

    /// Override the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(
        &self,
        input: &Path,
        output: &Path,
        segment: &Segment,
        encoding: &AudioEncoding,
    ) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.timeout(self.timeout);
        cmd.arg("-i").arg(input.to_string_lossy());
        cmd.args(["-ss".to_string(), format_seconds(segment.start)]);
        // The final part runs to end of stream so no trailing audio is lost
        // to rounding.
        if !segment.is_last {
            cmd.args(["-t".to_string(), format_seconds(segment.length)]);
        }
        cmd.args(["-acodec", encoding.codec.as_str()]);
        cmd.args(["-b:a", encoding.bitrate.as_str()]);
        cmd.arg("-y").arg(output.to_string_lossy());
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        segment: &Segment,
        encoding: &AudioEncoding,
    ) -> Result<()> {
        tracing::debug!(
            "transcoding part {} [{:.3}s, {:.3}s) of {:?} -> {:?}",
            segment.number(),
            segment.start,
            segment.end(),
            input,
            output
        );
        self.command(input, output, segment, encoding)
            .execute()
            .await?;
        Ok(())
    }
}

/// Seconds with millisecond precision, the form ffmpeg accepts for `-ss`/`-t`.
fn format_seconds(secs: f64) -> String {
    format!("{secs:.3}")
}
