//! Fetch missing data files before the catalog is loaded.

use crate::config::RemoteFile;
use crate::error::{DataLoadError, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Download every file whose local path does not exist yet.
///
/// Existing files are left untouched. Each download is written to a
/// `.part` sibling and renamed into place once complete, so an interrupted
/// run never leaves a truncated file at the final path.
///
/// Returns the paths that were downloaded.
pub async fn ensure_data(files: &[RemoteFile]) -> Result<Vec<PathBuf>> {
    let client = reqwest::Client::new();
    let mut fetched = Vec::new();
    for file in files {
        if tokio::fs::try_exists(&file.path).await? {
            info!("{} already present", file.path.display());
            continue;
        }
        download(&client, &file.url, &file.path).await?;
        fetched.push(file.path.clone());
    }
    Ok(fetched)
}

#[instrument(skip(client))]
async fn download(client: &reqwest::Client, url: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    info!("Downloading {} ...", url);
    let failed = |e: reqwest::Error| DataLoadError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(failed)?;

    let partial = part_path(path);
    let mut out = tokio::fs::File::create(&partial).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(failed)? {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;
    drop(out);
    tokio::fs::rename(&partial, path).await?;

    info!("Downloaded {} bytes to {}", written, path.display());
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_existing_files_are_not_downloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("asin_title_map.csv");
        std::fs::write(&path, "asin,title\n").unwrap();

        // The URL is unreachable; it must never be requested
        let files = vec![RemoteFile::new(&path, "http://127.0.0.1:9/unused".to_string())];
        let fetched = ensure_data(&files).await.unwrap();

        assert!(fetched.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "asin,title\n");
    }

    #[tokio::test]
    async fn test_failed_download_reports_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("Electronics.csv.gz");
        let files = vec![RemoteFile::new(&path, "http://127.0.0.1:9/missing".to_string())];

        let err = ensure_data(&files).await.unwrap_err();
        assert!(matches!(err, DataLoadError::Download { ref url, .. } if url.ends_with("/missing")));
        assert!(!path.exists());
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("data/Electronics.csv.gz")),
            Path::new("data/Electronics.csv.gz.part")
        );
    }
}
