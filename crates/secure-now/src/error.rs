use std::path::PathBuf;

use reqwest::StatusCode;

/// Failure of a single asset download.
///
/// These are recoverable: the resolver logs them, records them on the
/// resolved set and moves on to the next asset.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to download {url}. Status Code: {status}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to download {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to write {url} to {}: {source}", path.display())]
    Write {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// URL of the asset that failed
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::Write { url, .. } => url,
        }
    }

    /// HTTP status, when the server answered with an error status
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Request { source, .. } => source.status(),
            _ => None,
        }
    }
}

// Fatal errors: without a cache directory or a client nothing can be resolved
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Cannot create certificate cache directory {}: {source}", path.display())]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Invalid proxy configuration: {0}")]
    Proxy(String),
}

impl From<reqwest::Error> for CertError {
    fn from(err: reqwest::Error) -> Self {
        CertError::Client(err.to_string())
    }
}

impl From<rustls::Error> for CertError {
    fn from(err: rustls::Error) -> Self {
        CertError::Client(format!("TLS configuration: {err}"))
    }
}
