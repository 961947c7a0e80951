//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a [`BotContext`] to in-memory fakes:
//! a [`RecordingGateway`] in place of Telegram, a [`FakeExtractor`] in place
//! of yt-dlp, and fixed duration/transcode stand-ins for ffprobe and ffmpeg.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use tubecast::bot::BotContext;
use tubecast::telegram::{AudioUpload, Chat, ChatGateway, Message, User};
use tubecast_av::{
    AudioEncoding, AudioExtractor, DurationProber, Segment, SplitSettings, Splitter, Transcoder,
    VideoInfo,
};

/// A chat operation observed by [`RecordingGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat_id: i64,
        reply_to: Option<i64>,
        text: String,
        message_id: i64,
    },
    Edit {
        message_id: i64,
        text: String,
    },
    Delete {
        message_id: i64,
    },
    Audio {
        upload: AudioUpload,
        /// Whether the audio file existed when it was uploaded.
        existed: bool,
        thumbnail_existed: bool,
    },
}

pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<(AudioUpload, bool, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Audio {
                    upload,
                    existed,
                    thumbnail_existed,
                } => Some((upload, existed, thumbnail_existed)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { message_id } => Some(message_id),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn send_text(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &str,
    ) -> anyhow::Result<Message> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call::Send {
            chat_id,
            reply_to,
            text: text.to_string(),
            message_id,
        });
        Ok(Message {
            message_id,
            chat: Chat { id: chat_id },
            from: None,
            text: Some(text.to_string()),
        })
    }

    async fn edit_text(&self, _chat_id: i64, message_id: i64, text: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Edit {
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, _chat_id: i64, message_id: i64) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Delete { message_id });
        Ok(())
    }

    async fn send_audio(
        &self,
        _chat_id: i64,
        _reply_to: Option<i64>,
        audio: &AudioUpload,
    ) -> anyhow::Result<()> {
        let existed = audio.path.exists();
        let thumbnail_existed = audio.thumbnail.as_deref().is_some_and(Path::exists);
        self.calls.lock().unwrap().push(Call::Audio {
            upload: audio.clone(),
            existed,
            thumbnail_existed,
        });
        Ok(())
    }
}

/// Extractor that "downloads" a sparse file of a fixed size.
pub struct FakeExtractor {
    pub info: VideoInfo,
    pub audio_size: u64,
    pub fail_download: bool,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn fetch_info(&self, _url: &str) -> tubecast_av::Result<VideoInfo> {
        Ok(self.info.clone())
    }

    async fn download_audio(&self, _url: &str, output_stem: &Path) -> tubecast_av::Result<PathBuf> {
        let mut name = output_stem.as_os_str().to_os_string();
        name.push(".mp3");
        let path = PathBuf::from(name);

        if self.fail_download {
            // Leave a partial download behind, like an interrupted yt-dlp run.
            let mut partial = path.as_os_str().to_os_string();
            partial.push(".part");
            std::fs::write(PathBuf::from(partial), b"partial")?;
            return Err(tubecast_av::Error::tool_failed(
                "yt-dlp",
                "ERROR: Private video",
            ));
        }

        let file = std::fs::File::create(&path)?;
        file.set_len(self.audio_size)?;
        Ok(path)
    }
}

pub struct FixedProber(pub f64);

#[async_trait]
impl DurationProber for FixedProber {
    async fn probe_duration(&self, _path: &Path) -> f64 {
        self.0
    }
}

/// Writes a small placeholder for each requested segment.
pub struct StubTranscoder;

#[async_trait]
impl Transcoder for StubTranscoder {
    async fn transcode(
        &self,
        _input: &Path,
        output: &Path,
        segment: &Segment,
        _encoding: &AudioEncoding,
    ) -> tubecast_av::Result<()> {
        std::fs::write(output, format!("part {}", segment.number()))?;
        Ok(())
    }
}

pub fn video_info(thumbnail: Option<String>) -> VideoInfo {
    VideoInfo {
        title: "Long Mix".into(),
        channel: "Some DJ".into(),
        duration: Some(300),
        thumbnail,
    }
}

pub fn text_message(message_id: i64, chat_id: i64, user_id: i64, text: &str) -> Message {
    Message {
        message_id,
        chat: Chat { id: chat_id },
        from: Some(User {
            id: user_id,
            is_bot: false,
            first_name: "Sam".into(),
            username: None,
        }),
        text: Some(text.to_string()),
    }
}

/// Test harness wrapping a [`BotContext`] backed by fakes and a temporary
/// download directory.
pub struct TestHarness {
    pub ctx: BotContext,
    pub gateway: Arc<RecordingGateway>,
    pub temp: TempDir,
}

impl TestHarness {
    /// `max_part_bytes` is the split ceiling; the prober reports 300 seconds.
    pub fn new(extractor: FakeExtractor, max_part_bytes: u64) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::new());
        let settings = SplitSettings {
            max_part_bytes,
            ..SplitSettings::default()
        };
        let splitter = Splitter::new(
            Arc::new(FixedProber(300.0)),
            Arc::new(StubTranscoder),
            settings,
        )
        .unwrap();

        let ctx = BotContext {
            gateway: gateway.clone(),
            extractor: Arc::new(extractor),
            splitter: Arc::new(splitter),
            http: reqwest::Client::new(),
            temp_dir: temp.path().join("downloads"),
        };

        Self { ctx, gateway, temp }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.ctx.temp_dir.clone()
    }

    /// Files left in the download directory.
    pub fn leftover_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.download_dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
