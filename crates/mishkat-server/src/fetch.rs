//! Native resource fetching for local files and HTTP(S) URLs

use anyhow::{Context, Result};
use mishkat_core::{FetchError, ResourceFetcher};
use std::path::PathBuf;

/// Fetches `http(s)://` URLs over the network and everything else from disk
pub struct NativeFetcher {
    client: reqwest::Client,
    /// Directory relative paths are read from
    root: PathBuf,
}

impl NativeFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            root: root.into(),
        })
    }

    async fn fetch_http(&self, url: &str, on_progress: &dyn Fn(f32)) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total = response.content_length().filter(|&n| n > 0);
        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::transport(url, e))?
        {
            bytes.extend_from_slice(&chunk);
            if let Some(total) = total {
                on_progress(percent(bytes.len() as u64, total));
            }
        }
        Ok(bytes)
    }
}

/// Download percent; compressed transfers can exceed the declared length
fn percent(received: u64, total: u64) -> f32 {
    ((received as f64 / total as f64) * 100.0).min(100.0) as f32
}

impl ResourceFetcher for NativeFetcher {
    async fn fetch(&self, url: &str, on_progress: &dyn Fn(f32)) -> Result<Vec<u8>, FetchError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url, on_progress).await;
        }

        let path = self.root.join(url.strip_prefix("file://").unwrap_or(url));
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }
            } else {
                FetchError::transport(url, e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(_: f32) {}

    #[tokio::test]
    async fn test_reads_relative_and_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bowl.ply"), b"ply").unwrap();

        let fetcher = NativeFetcher::new(dir.path()).unwrap();
        assert_eq!(fetcher.fetch("bowl.ply", &ignore).await.unwrap(), b"ply");

        let absolute = dir.path().join("bowl.ply");
        let fetcher = NativeFetcher::new(".").unwrap();
        assert_eq!(
            fetcher.fetch(absolute.to_str().unwrap(), &ignore).await.unwrap(),
            b"ply"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = NativeFetcher::new(dir.path()).unwrap();
        assert!(matches!(
            fetcher.fetch("gone.stl", &ignore).await,
            Err(FetchError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(512, 1024), 50.0);
        assert_eq!(percent(2048, 1024), 100.0);
    }
}
