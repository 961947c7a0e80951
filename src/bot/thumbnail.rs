use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Download a thumbnail to `dest`.
///
/// A missing thumbnail never fails a request, so errors are logged and
/// reported as `None`.
pub async fn download_thumbnail(client: &Client, url: &str, dest: &Path) -> Option<PathBuf> {
    match fetch(client, url, dest).await {
        Ok(()) => Some(dest.to_path_buf()),
        Err(e) => {
            tracing::error!("Error downloading thumbnail: {:#}", e);
            None
        }
    }
}

async fn fetch(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let data = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download thumbnail from {}", url))?
        .error_for_status()
        .with_context(|| format!("HTTP error downloading thumbnail from {}", url))?
        .bytes()
        .await
        .with_context(|| format!("Failed to read thumbnail bytes from {}", url))?;

    tokio::fs::write(dest, &data)
        .await
        .with_context(|| format!("Failed to write thumbnail to {}", dest.display()))?;
    Ok(())
}
