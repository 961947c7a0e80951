use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use tubecast_av::split::DEFAULT_MAX_PART_BYTES;
use tubecast_av::{AudioEncoding, SplitSettings, ToolPaths};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub tools: ToolPaths,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. The `BOT_TOKEN` environment variable
    /// takes precedence.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot API base URL (override for a self-hosted Bot API server)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Long-polling timeout for getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SplitConfig {
    /// Largest file sent in one message, in bytes (default: 45 MiB)
    #[serde(default = "default_max_part_bytes")]
    pub max_part_bytes: u64,

    /// ffmpeg encoder for split parts
    #[serde(default = "default_codec")]
    pub codec: String,

    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// Extension of split part files
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Kill an ffmpeg run that takes longer than this
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,
}

fn default_max_part_bytes() -> u64 {
    DEFAULT_MAX_PART_BYTES
}
fn default_codec() -> String {
    AudioEncoding::default().codec
}
fn default_bitrate() -> String {
    AudioEncoding::default().bitrate
}
fn default_extension() -> String {
    "mp3".to_string()
}
fn default_transcode_timeout() -> u64 {
    600
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_part_bytes: default_max_part_bytes(),
            codec: default_codec(),
            bitrate: default_bitrate(),
            extension: default_extension(),
            transcode_timeout_secs: default_transcode_timeout(),
        }
    }
}

impl SplitConfig {
    pub fn settings(&self) -> SplitSettings {
        SplitSettings {
            max_part_bytes: self.max_part_bytes,
            encoding: AudioEncoding {
                codec: self.codec.clone(),
                bitrate: self.bitrate.clone(),
            },
            extension: self.extension.clone(),
        }
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Scratch directory for downloads, thumbnails and parts
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Kill a yt-dlp download that takes longer than this
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp_downloads")
}
fn default_download_timeout() -> u64 {
    900
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            timeout_secs: default_download_timeout(),
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
