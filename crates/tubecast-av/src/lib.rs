//! # tubecast-av
//!
//! Audio tooling for tubecast: everything that shells out to ffmpeg, ffprobe
//! or yt-dlp.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg,
//!   ffprobe and yt-dlp.
//! - **Command execution** ([`ToolCommand`]) -- async builder with a timeout
//!   that kills the child.
//! - **Duration probing** ([`DurationProber`], [`FfprobeProber`]).
//! - **Segment transcoding** ([`Transcoder`], [`FfmpegTranscoder`]).
//! - **Size-bounded splitting** ([`Splitter`]) -- plan uniform time ranges
//!   from the byte size and materialize each as its own file.
//! - **Extraction** ([`AudioExtractor`], [`YtDlpExtractor`]) -- video metadata
//!   and MP3 downloads.
//! - **Request files** ([`RequestFiles`]) -- per-user temp file naming and
//!   cleanup.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tubecast_av::{FfmpegTranscoder, FfprobeProber, SplitSettings, Splitter, ToolPaths, ToolRegistry};
//!
//! # async fn example() -> tubecast_av::Result<()> {
//! let tools = ToolRegistry::discover(&ToolPaths::default());
//! let splitter = Splitter::new(
//!     Arc::new(FfprobeProber::from_registry(&tools)?),
//!     Arc::new(FfmpegTranscoder::from_registry(&tools)?),
//!     SplitSettings::default(),
//! )?;
//! for path in splitter.split_if_needed("long_mix.mp3".as_ref()).await?.paths() {
//!     println!("{}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
mod error;
pub mod extract;
pub mod probe;
pub mod split;
pub mod tools;
pub mod transcode;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use extract::{is_youtube_url, AudioExtractor, VideoInfo, YtDlpExtractor};
pub use probe::{DurationProber, FfprobeProber};
pub use split::{
    Segment, SegmentPlan, SplitOutcome, SplitPart, SplitSettings, Splitter, UnsplitReason,
};
pub use tools::{ToolInfo, ToolPaths, ToolRegistry};
pub use transcode::{AudioEncoding, FfmpegTranscoder, Transcoder};
pub use workspace::RequestFiles;
