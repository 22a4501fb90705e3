//! # Cache Store
//!
//! Directory handling, entry naming and eviction for the certificate cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::io;
use tracing::{debug, info, warn};

use super::expiry::{Clock, DEFAULT_EXPIRY, ExpiryPolicy};
use super::key::derive_key;
use crate::assets::AssetDescriptor;
use crate::error::CertError;

/// Default cache location, relative to the working directory of the host
pub const DEFAULT_CACHE_DIR: &str = "node_modules/.vite/traefik.me";

/// Configuration for the certificate cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding cached certificate files
    pub cache_dir: PathBuf,
    /// Age after which an entry is discarded
    pub expiry: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            expiry: DEFAULT_EXPIRY,
        }
    }
}

impl CacheConfig {
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }
}

/// A cached file and the time it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Creation time, or modification time where the filesystem does not
    /// record creation
    pub created: SystemTime,
    pub size: u64,
}

impl CacheEntry {
    fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> io::Result<Self> {
        let created = metadata.created().or_else(|_| metadata.modified())?;
        Ok(Self {
            path,
            created,
            size: metadata.len(),
        })
    }
}

/// File-based certificate cache
#[derive(Debug, Clone)]
pub struct CertCache {
    cache_dir: PathBuf,
    policy: ExpiryPolicy,
}

impl CertCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            policy: ExpiryPolicy::new(config.expiry),
        }
    }

    /// Cache whose expiry decisions use the given clock
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            policy: ExpiryPolicy::with_clock(config.expiry, clock),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    /// Create the cache directory and its parents if missing
    pub async fn ensure_dir(&self) -> Result<(), CertError> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|source| CertError::CacheDir {
                path: self.cache_dir.clone(),
                source,
            })
    }

    /// Path of the cache entry for a descriptor: `<name>-<sha256(url)>`
    pub fn entry_path(&self, descriptor: &AssetDescriptor) -> PathBuf {
        self.cache_dir
            .join(format!("{}-{}", descriptor.name, derive_key(&descriptor.url)))
    }

    /// Look up the entry at `path`, without judging its age
    pub async fn lookup(&self, path: &Path) -> io::Result<Option<CacheEntry>> {
        match fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => {
                CacheEntry::from_metadata(path.to_path_buf(), &metadata).map(Some)
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Return the entry at `path` if it can be reused.
    ///
    /// Stale entries are deleted so the caller downloads a fresh copy. A
    /// stale entry that cannot be deleted is reported as missing; the
    /// subsequent download replaces it with a new file.
    pub async fn fresh_entry(&self, path: &Path) -> Option<CacheEntry> {
        let entry = match self.lookup(path).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to inspect cached certificate");
                return None;
            }
        };

        if !self.policy.is_stale(&entry) {
            debug!(path = ?path, "Using cached certificate");
            return Some(entry);
        }

        info!("Removing outdated cache: {}", path.display());
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = ?path, error = %e, "Failed to remove outdated cache entry");
            }
        }
        None
    }

    /// List every file in the cache directory
    pub async fn entries(&self) -> Result<Vec<CacheEntry>, CertError> {
        let mut dir = match fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CertError::Io {
                    path: self.cache_dir.clone(),
                    source,
                });
            }
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await.map_err(|source| CertError::Io {
            path: self.cache_dir.clone(),
            source,
        })? {
            let path = item.path();
            if let Ok(Some(entry)) = self.lookup(&path).await {
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Remove every cached file, returning how many were deleted
    pub async fn clear(&self) -> Result<usize, CertError> {
        let mut removed = 0;
        for entry in self.entries().await? {
            match fs::remove_file(&entry.path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(CertError::Io {
                        path: entry.path,
                        source,
                    });
                }
            }
        }

        debug!(count = removed, dir = ?self.cache_dir, "Cleared certificate cache");
        Ok(removed)
    }
}
