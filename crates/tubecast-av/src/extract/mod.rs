//! Audio extraction from video URLs.

mod url;
mod ytdlp;

pub use self::url::is_youtube_url;
pub use self::ytdlp::YtDlpExtractor;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Metadata about a video, fetched without downloading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    /// Uploader name.
    pub channel: String,
    /// Whole seconds, if the site reports it.
    pub duration: Option<u64>,
    /// Thumbnail image URL.
    pub thumbnail: Option<String>,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            title: "Unknown".into(),
            channel: "Unknown".into(),
            duration: None,
            thumbnail: None,
        }
    }
}

/// Fetches video metadata and downloads audio tracks.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Look up metadata for `url`.
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo>;

    /// Download the audio of `url` as MP3, writing to `output_stem` plus the
    /// `.mp3` extension. Returns the written path.
    async fn download_audio(&self, url: &str, output_stem: &Path) -> Result<PathBuf>;
}
