//! yt-dlp backed [`AudioExtractor`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{AudioExtractor, VideoInfo};
use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::{Error, Result};

/// Metadata lookups should be quick; downloads get the longer timeout.
const INFO_TIMEOUT: Duration = Duration::from_secs(120);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(900);

/// Extracts audio by shelling out to `yt-dlp`.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    audio_quality: String,
    download_timeout: Duration,
}

impl YtDlpExtractor {
    pub fn new(ytdlp_path: PathBuf) -> Self {
        Self {
            ytdlp_path,
            audio_quality: "192K".into(),
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }

    /// Create an extractor from the registry's yt-dlp entry.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        Ok(Self::new(tools.require("yt-dlp")?.to_path_buf()))
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    fn info_command(&self, url: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ytdlp_path.clone());
        cmd.timeout(INFO_TIMEOUT);
        cmd.args([
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
        ]);
        cmd.arg(url);
        cmd
    }

    fn download_command(&self, url: &str, output_stem: &Path) -> ToolCommand {
        let template = format!("{}.%(ext)s", output_stem.to_string_lossy());
        let mut cmd = ToolCommand::new(self.ytdlp_path.clone());
        cmd.timeout(self.download_timeout);
        cmd.args(["-f", "bestaudio/best", "-x", "--audio-format", "mp3"]);
        cmd.args(["--audio-quality", self.audio_quality.as_str()]);
        cmd.args(["--no-playlist", "--no-warnings", "--quiet"]);
        cmd.arg("-o").arg(template);
        cmd.arg(url);
        cmd
    }
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo> {
        let output = self.info_command(url).execute().await?;
        parse_info(&output.stdout)
    }

    async fn download_audio(&self, url: &str, output_stem: &Path) -> Result<PathBuf> {
        self.download_command(url, output_stem).execute().await?;

        let path = with_appended_extension(output_stem, "mp3");
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::file_not_found(path));
        }

        tracing::info!(
            "downloaded {} ({:.1} MB)",
            path.display(),
            tokio::fs::metadata(&path).await?.len() as f64 / 1_048_576.0
        );
        Ok(path)
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
}

/// Map `yt-dlp --dump-single-json` output to [`VideoInfo`].
pub(crate) fn parse_info(json: &str) -> Result<VideoInfo> {
    let raw: YtDlpInfo = serde_json::from_str(json)
        .map_err(|e| Error::parse_error("yt-dlp", format!("invalid info JSON: {e}")))?;
    let defaults = VideoInfo::default();

    Ok(VideoInfo {
        title: raw.title.filter(|t| !t.is_empty()).unwrap_or(defaults.title),
        channel: raw.uploader.filter(|c| !c.is_empty()).unwrap_or(defaults.channel),
        duration: raw
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d as u64),
        thumbnail: raw.thumbnail.filter(|t| !t.is_empty()),
    })
}

fn with_appended_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(stem.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_info() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "uploader": "Rick Astley",
            "duration": 212,
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        }"#;
        let info = parse_info(json).unwrap();
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.channel, "Rick Astley");
        assert_eq!(info.duration, Some(212));
        assert_eq!(
            info.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
    }

    #[test]
    fn missing_fields_fall_back_to_unknown() {
        let info = parse_info(r#"{"id": "x", "duration": null}"#).unwrap();
        assert_eq!(info, VideoInfo::default());
    }

    #[test]
    fn fractional_duration_is_truncated() {
        let info = parse_info(r#"{"duration": 59.9}"#).unwrap();
        assert_eq!(info.duration, Some(59));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(parse_info("not json"), Err(Error::ParseError { .. })));
    }

    #[test]
    fn download_writes_to_stem_template() {
        let extractor = YtDlpExtractor::new(PathBuf::from("yt-dlp"));
        let cmd = extractor.download_command("https://youtu.be/x", Path::new("/tmp/7_Song"));
        let args = cmd.get_args();
        assert!(args.windows(2).any(|w| w == ["-o", "/tmp/7_Song.%(ext)s"]));
        assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/x"));
    }

    #[test]
    fn appended_extension_keeps_dots_in_stem() {
        assert_eq!(
            with_appended_extension(Path::new("/tmp/1_v1.2 live"), "mp3"),
            PathBuf::from("/tmp/1_v1.2 live.mp3")
        );
    }

    #[tokio::test]
    async fn missing_binary_fails_info_lookup() {
        let extractor = YtDlpExtractor::new(PathBuf::from("nonexistent_ytdlp_xyz"));
        assert!(extractor.fetch_info("https://youtu.be/x").await.is_err());
    }
}
