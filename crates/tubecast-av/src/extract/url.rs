//! YouTube URL recognition.

const YOUTUBE_DOMAINS: &[&str] = &["youtube.com", "youtu.be", "www.youtube.com", "m.youtube.com"];

/// Whether `text` looks like a YouTube link.
///
/// This is a loose containment check on the lowercased text; yt-dlp is the
/// final judge of whether the link is actually downloadable.
pub fn is_youtube_url(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    YOUTUBE_DOMAINS.iter().any(|d| lower.contains(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_domains() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://m.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("youtube.com/shorts/abc"));
    }

    #[test]
    fn is_case_insensitive() {
        assert!(is_youtube_url("HTTPS://WWW.YOUTUBE.COM/watch?v=abc"));
        assert!(is_youtube_url("  https://YouTu.be/abc  "));
    }

    #[test]
    fn rejects_other_text() {
        assert!(!is_youtube_url("https://vimeo.com/123"));
        assert!(!is_youtube_url("hello there"));
        assert!(!is_youtube_url(""));
    }
}
