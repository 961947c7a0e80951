//! Per-request scratch files.
//!
//! Every request writes into the shared download directory under names keyed
//! by the requesting user, so concurrent requests from different users never
//! collide. [`RequestFiles`] hands out those names and remembers them, so the
//! error path can remove whatever a failed request left behind.

use std::path::{Path, PathBuf};

use crate::Result;

/// Maximum number of title characters kept in file names.
const TITLE_CHARS: usize = 50;

/// File names for one user's request inside the download directory.
#[derive(Debug)]
pub struct RequestFiles {
    dir: PathBuf,
    owner: i64,
    tracked: Vec<PathBuf>,
}

impl RequestFiles {
    /// Create the download directory if needed and start tracking files for
    /// `owner`.
    pub async fn new(dir: impl Into<PathBuf>, owner: i64) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            owner,
            tracked: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extension-less download target for a video titled `title`.
    pub fn audio_stem(&mut self, title: &str) -> PathBuf {
        let path = self
            .dir
            .join(format!("{}_{}", self.owner, sanitize_title(title)));
        self.track(path.clone());
        path
    }

    /// Download target for the video thumbnail.
    pub fn thumbnail(&mut self) -> PathBuf {
        let path = self.dir.join(format!("{}_thumb.jpg", self.owner));
        self.track(path.clone());
        path
    }

    /// Remember a file produced on behalf of this request.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.tracked.push(path.into());
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Remove every tracked file that still exists.
    ///
    /// Download stems are matched by prefix, since the downloader chooses the
    /// final extension. Returns the number of files removed.
    pub async fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in std::mem::take(&mut self.tracked) {
            for candidate in self.expand(&path).await {
                match tokio::fs::remove_file(&candidate).await {
                    Ok(()) => {
                        tracing::debug!("removed {}", candidate.display());
                        removed += 1;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => tracing::warn!("failed to remove {}: {e}", candidate.display()),
                }
            }
        }
        removed
    }

    /// The path itself plus any `<path>.*` / `<path>_part*` siblings.
    async fn expand(&self, path: &Path) -> Vec<PathBuf> {
        let mut found = vec![path.to_path_buf()];
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return found;
        };
        let name = name.to_string_lossy().into_owned();
        let Ok(mut entries) = tokio::fs::read_dir(parent).await else {
            return found;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(rest) = entry_name.strip_prefix(&name) {
                if rest.starts_with('.') || rest.starts_with("_part") {
                    found.push(entry.path());
                }
            }
        }
        found
    }
}

/// Make a video title safe to embed in a single path component.
///
/// Keeps at most 50 characters and replaces separators, control characters
/// and characters yt-dlp treats as template syntax.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .take(TITLE_CHARS)
        .map(|c| match c {
            '/' | '\\' | '%' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "audio".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_to_fifty_chars() {
        let long = "x".repeat(80);
        assert_eq!(sanitize_title(&long).chars().count(), 50);
        let accented = "é".repeat(60);
        assert_eq!(sanitize_title(&accented).chars().count(), 50);
    }

    #[test]
    fn sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_title("AC/DC: Live 100%"), "AC_DC_ Live 100_");
        assert_eq!(sanitize_title("../../etc"), "_.._etc");
        assert_eq!(sanitize_title("   "), "audio");
    }

    #[tokio::test]
    async fn names_are_keyed_by_owner() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = RequestFiles::new(dir.path(), 1).await.unwrap();
        let mut b = RequestFiles::new(dir.path(), 2).await.unwrap();

        assert_ne!(a.audio_stem("Same"), b.audio_stem("Same"));
        assert_eq!(a.thumbnail(), dir.path().join("1_thumb.jpg"));
        assert_eq!(b.thumbnail(), dir.path().join("2_thumb.jpg"));
    }

    #[tokio::test]
    async fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("temp_downloads");
        let files = RequestFiles::new(&nested, 9).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(files.dir(), nested);
    }

    #[tokio::test]
    async fn cleanup_removes_downloads_and_parts_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = RequestFiles::new(dir.path(), 5).await.unwrap();
        let stem = files.audio_stem("Song");
        let thumb = files.thumbnail();

        std::fs::write(dir.path().join("5_Song.mp3"), b"a").unwrap();
        std::fs::write(dir.path().join("5_Song_part1.mp3"), b"a").unwrap();
        std::fs::write(&thumb, b"t").unwrap();
        std::fs::write(dir.path().join("5_Songbird.mp3"), b"other").unwrap();
        std::fs::write(dir.path().join("6_Song.mp3"), b"other user").unwrap();

        assert_eq!(files.cleanup().await, 3);
        assert!(!dir.path().join("5_Song.mp3").exists());
        assert!(!dir.path().join("5_Song_part1.mp3").exists());
        assert!(!thumb.exists());
        assert!(dir.path().join("5_Songbird.mp3").exists());
        assert!(dir.path().join("6_Song.mp3").exists());
        assert!(files.tracked().is_empty());
        assert_eq!(stem, dir.path().join("5_Song"));
    }
}
