//! User-facing texts.

use tubecast_av::VideoInfo;

pub const WELCOME: &str = "🎵 Welcome to YouTube Audio Converter Bot!\n\n\
Send me a YouTube URL and I'll convert it to audio for you.\n\n\
Just paste the link and I'll handle the rest! 🎧";

pub const INVALID_URL: &str = "❌ Invalid URL. Please send a valid YouTube link.";
pub const PROCESSING: &str = "⏳ Processing your request...";
pub const FETCHING_INFO: &str = "📥 Fetching video information...";
pub const DOWNLOADING: &str = "⬇️ Downloading audio...";
pub const CONVERTING: &str = "🎵 Converting audio...";

pub const DOWNLOAD_FAILED: &str = "❌ Error: Unable to download this video.\n\
It might be age-restricted, private, or unavailable.";

pub const PROCESSING_FAILED: &str = "❌ An error occurred while processing your request.\n\
Please try again later or with a different video.";

/// Usage text; mentions the per-part limit in whole megabytes.
pub fn help(max_part_bytes: u64) -> String {
    format!(
        "📖 How to use:\n\n\
         1. Send me any YouTube video URL\n\
         2. Wait while I process it\n\
         3. Receive your audio file(s)\n\n\
         Note: Large videos will be split into multiple parts (under {}MB each)",
        max_part_bytes / (1024 * 1024)
    )
}

pub fn sending(parts: usize) -> String {
    format!("📤 Sending audio... ({} part(s))", parts)
}

/// Caption for part `number` (1-based) of `total`.
pub fn caption(info: &VideoInfo, number: usize, total: usize) -> String {
    let mut caption = format!("🎵 {}", info.title);
    if total > 1 {
        caption.push_str(&format!("\n📦 Part {}/{}", number, total));
    }
    caption.push_str(&format!("\n👤 {}", info.channel));
    caption
}
