//! Per-message request handling.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tubecast_av::{
    is_youtube_url, AudioExtractor, RequestFiles, SplitOutcome, Splitter, VideoInfo,
};

use super::messages;
use super::thumbnail::download_thumbnail;
use crate::telegram::{AudioUpload, ChatGateway, Message};

/// Everything a request needs, shared across concurrently handled messages.
#[derive(Clone)]
pub struct BotContext {
    pub gateway: Arc<dyn ChatGateway>,
    pub extractor: Arc<dyn AudioExtractor>,
    pub splitter: Arc<Splitter>,
    pub http: reqwest::Client,
    pub temp_dir: PathBuf,
}

/// Failure of a URL request, split by what the user is told.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// yt-dlp could not look up or download the video.
    #[error("extraction failed: {0}")]
    Extraction(#[source] tubecast_av::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProcessError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProcessError::Extraction(_) => messages::DOWNLOAD_FAILED,
            ProcessError::Other(_) => messages::PROCESSING_FAILED,
        }
    }
}

/// Bot commands the handler answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

/// Parse a `/command` (optionally `/command@botname`). Unknown commands are
/// `Some(None)`; plain text is `None`.
pub fn parse_command(text: &str) -> Option<Option<Command>> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    Some(match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        _ => None,
    })
}

/// Handle one incoming message.
pub async fn handle_message(ctx: &BotContext, message: Message) -> anyhow::Result<()> {
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };
    let chat_id = message.chat.id;

    match parse_command(text) {
        Some(Some(Command::Start)) => {
            ctx.gateway.send_text(chat_id, Some(message.message_id), messages::WELCOME).await?;
        }
        Some(Some(Command::Help)) => {
            let help = messages::help(ctx.splitter.settings().max_part_bytes);
            ctx.gateway.send_text(chat_id, Some(message.message_id), &help).await?;
        }
        Some(None) => tracing::debug!("ignoring unknown command {:?}", text),
        None => process_youtube_url(ctx, &message, text.trim()).await?,
    }

    Ok(())
}

/// Turn a YouTube link into one or more audio messages.
///
/// Progress is shown by editing a single status message, which is deleted
/// once every part has been delivered. On failure the status message is
/// replaced by an error text and the request's files are removed.
pub async fn process_youtube_url(ctx: &BotContext, message: &Message, url: &str) -> anyhow::Result<()> {
    let chat_id = message.chat.id;

    if !is_youtube_url(url) {
        ctx.gateway
            .send_text(chat_id, Some(message.message_id), messages::INVALID_URL)
            .await?;
        return Ok(());
    }

    let status = ctx
        .gateway
        .send_text(chat_id, Some(message.message_id), messages::PROCESSING)
        .await?;

    // File names are keyed by user so concurrent requests cannot collide.
    let user_id = message.from.as_ref().map(|u| u.id).unwrap_or(chat_id);
    let mut files = RequestFiles::new(&ctx.temp_dir, user_id).await?;

    let request = Request {
        ctx,
        chat_id,
        reply_to: message.message_id,
        status_id: status.message_id,
        url,
    };

    match request.run(&mut files).await {
        Ok(parts) => {
            tracing::info!("delivered {} part(s) of {} to user {}", parts, url, user_id);
            if let Err(e) = ctx.gateway.delete_message(chat_id, status.message_id).await {
                tracing::warn!("failed to delete status message: {:#}", e);
            }
        }
        Err(e) => {
            match &e {
                ProcessError::Extraction(err) => tracing::error!("Download error: {}", err),
                ProcessError::Other(err) => tracing::error!("Error processing URL: {:#}", err),
            }
            let removed = files.cleanup().await;
            tracing::debug!("removed {} leftover file(s) for user {}", removed, user_id);
            ctx.gateway
                .edit_text(chat_id, status.message_id, e.user_message())
                .await?;
        }
    }

    Ok(())
}

struct Request<'a> {
    ctx: &'a BotContext,
    chat_id: i64,
    reply_to: i64,
    status_id: i64,
    url: &'a str,
}

impl Request<'_> {
    async fn status(&self, text: &str) -> Result<(), ProcessError> {
        self.ctx
            .gateway
            .edit_text(self.chat_id, self.status_id, text)
            .await?;
        Ok(())
    }

    /// Returns the number of parts delivered.
    async fn run(&self, files: &mut RequestFiles) -> Result<usize, ProcessError> {
        let ctx = self.ctx;

        self.status(messages::FETCHING_INFO).await?;
        let info = ctx
            .extractor
            .fetch_info(self.url)
            .await
            .map_err(ProcessError::Extraction)?;

        self.status(messages::DOWNLOADING).await?;
        let stem = files.audio_stem(&info.title);
        let audio = ctx
            .extractor
            .download_audio(self.url, &stem)
            .await
            .map_err(ProcessError::Extraction)?;

        self.status(messages::CONVERTING).await?;
        let outcome = ctx
            .splitter
            .split_if_needed(&audio)
            .await
            .map_err(|e| ProcessError::Other(e.into()))?;
        if outcome.is_degraded() {
            tracing::warn!("delivering {} unsplit: {:?}", audio.display(), outcome);
        }

        let thumbnail = match info.thumbnail.as_deref() {
            Some(thumb_url) => {
                let dest = files.thumbnail();
                download_thumbnail(&ctx.http, thumb_url, &dest).await
            }
            None => None,
        };

        let uploads = build_uploads(&info, &outcome, thumbnail.as_deref());
        self.status(&messages::sending(uploads.len())).await?;

        for upload in &uploads {
            ctx.gateway
                .send_audio(self.chat_id, Some(self.reply_to), upload)
                .await?;
            remove_quietly(&upload.path).await;
        }

        if let Some(thumb) = thumbnail {
            remove_quietly(&thumb).await;
        }

        Ok(uploads.len())
    }
}

/// One upload per delivered file, in part order.
///
/// Split parts report their own segment length; an unsplit file reports the
/// video's duration.
pub fn build_uploads(
    info: &VideoInfo,
    outcome: &SplitOutcome,
    thumbnail: Option<&Path>,
) -> Vec<AudioUpload> {
    let total = outcome.part_count();
    let upload = |path: PathBuf, number: usize, duration: Option<u64>| AudioUpload {
        path,
        thumbnail: thumbnail.map(Path::to_path_buf),
        caption: messages::caption(info, number, total),
        title: info.title.clone(),
        performer: info.channel.clone(),
        duration,
    };

    match outcome {
        SplitOutcome::Split { parts } => parts
            .iter()
            .map(|p| {
                upload(
                    p.path.clone(),
                    p.segment.number(),
                    Some(p.segment.length.round() as u64),
                )
            })
            .collect(),
        SplitOutcome::Unsplit { path, .. } => vec![upload(path.clone(), 1, info.duration)],
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("failed to remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubecast_av::{Segment, SplitPart, UnsplitReason};

    fn info() -> VideoInfo {
        VideoInfo {
            title: "Mix".into(),
            channel: "DJ".into(),
            duration: Some(600),
            thumbnail: None,
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("/start"), Some(Some(Command::Start)));
        assert_eq!(parse_command("/help@tubecast_bot"), Some(Some(Command::Help)));
        assert_eq!(parse_command("/unknown arg"), Some(None));
        assert_eq!(parse_command("https://youtu.be/x"), None);
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn unsplit_upload_uses_video_duration() {
        let outcome = SplitOutcome::Unsplit {
            path: PathBuf::from("/tmp/1_Mix.mp3"),
            reason: UnsplitReason::WithinCeiling,
        };
        let uploads = build_uploads(&info(), &outcome, Some(Path::new("/tmp/1_thumb.jpg")));
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].duration, Some(600));
        assert_eq!(uploads[0].caption, "🎵 Mix\n👤 DJ");
        assert_eq!(uploads[0].thumbnail, Some(PathBuf::from("/tmp/1_thumb.jpg")));
        assert_eq!(uploads[0].performer, "DJ");
    }

    #[test]
    fn split_uploads_use_segment_lengths() {
        let parts = (0..3)
            .map(|index| SplitPart {
                path: PathBuf::from(format!("/tmp/1_Mix_part{}.mp3", index + 1)),
                segment: Segment {
                    index,
                    start: index as f64 * 200.0,
                    length: 200.0,
                    is_last: index == 2,
                },
            })
            .collect();
        let uploads = build_uploads(&info(), &SplitOutcome::Split { parts }, None);

        assert_eq!(uploads.len(), 3);
        assert!(uploads.iter().all(|u| u.duration == Some(200)));
        assert_eq!(uploads[1].caption, "🎵 Mix\n📦 Part 2/3\n👤 DJ");
        assert_eq!(uploads[2].path, PathBuf::from("/tmp/1_Mix_part3.mp3"));
        assert!(uploads[0].thumbnail.is_none());
    }

    #[test]
    fn error_texts_by_kind() {
        let extraction = ProcessError::Extraction(tubecast_av::Error::tool_failed("yt-dlp", "private"));
        let other = ProcessError::from(anyhow::anyhow!("telegram down"));
        assert_eq!(extraction.user_message(), messages::DOWNLOAD_FAILED);
        assert_eq!(other.user_message(), messages::PROCESSING_FAILED);
    }
}
