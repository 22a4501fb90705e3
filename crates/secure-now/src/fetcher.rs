// Asset fetcher: downloads one certificate file into the cache directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tempfile::{Builder, TempPath};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::client::create_client;
use crate::config::FetchConfig;
use crate::error::{CertError, FetchError};

/// Downloads a URL into a local file.
///
/// Implementations must not leave a partial file at `destination` when they
/// return an error or are cancelled mid-download.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError>;
}

/// Fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http_client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, CertError> {
        Ok(Self::with_client(create_client(config)?))
    }

    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    async fn stream_to_file(
        &self,
        url: &Url,
        destination: &Path,
    ) -> Result<u64, FetchError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let write_err = |source| FetchError::Write {
            url: url.to_string(),
            path: destination.to_path_buf(),
            source,
        };

        // The body goes to a sibling temp file that is renamed into place once
        // complete. Dropping this future mid-stream drops the `TempPath`, which
        // deletes the partial download.
        let (file, part_path) = create_part_file(destination).map_err(write_err)?;
        let mut file = File::from_std(file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        part_path
            .persist(destination)
            .map_err(|e| write_err(e.error))?;
        Ok(written)
    }
}

/// Create `.<name>.*.part` next to `destination`
fn create_part_file(destination: &Path) -> std::io::Result<(std::fs::File, TempPath)> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!(
        ".{}.",
        destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    Ok(Builder::new()
        .prefix(&prefix)
        .suffix(".part")
        .tempfile_in(dir)?
        .into_parts())
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        match self.stream_to_file(&parsed, destination).await {
            Ok(bytes) => {
                debug!(url, path = ?destination, bytes, "Downloaded certificate file");
                Ok(())
            }
            Err(e) => {
                // Never leave a truncated file where a cache entry is expected
                if let Err(remove_err) = fs::remove_file(destination).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        debug!(path = ?destination, error = %remove_err, "Failed to remove partial download");
                    }
                }
                Err(e)
            }
        }
    }
}
