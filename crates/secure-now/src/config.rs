use std::time::Duration;

use reqwest::Proxy;
use serde::{Deserialize, Serialize};

use crate::error::CertError;

const DEFAULT_USER_AGENT: &str = concat!("secure-now/", env!("CARGO_PKG_VERSION"));

/// Subdomain label used when the host does not configure one
pub const DEFAULT_PREFIX: &str = "vite";

/// Options a host passes to the plugin.
///
/// Every field is optional in serialized form, so an empty table yields the
/// defaults: HTTPS on both servers under `vite.traefik.me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureNowOptions {
    /// Enable HTTPS on the development server
    pub dev: bool,
    /// Enable HTTPS on the preview server
    pub preview: bool,
    /// Subdomain label of the serving domain (`<prefix>.traefik.me`)
    pub prefix: String,
}

impl Default for SecureNowOptions {
    fn default() -> Self {
        Self {
            dev: true,
            preview: true,
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }
}

impl SecureNowOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Proxy used for certificate downloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy server URL, e.g. `http://proxy.example.com:8080` or `socks5://127.0.0.1:1080`
    pub url: String,
    /// Optional basic-auth credentials as `(username, password)`
    pub auth: Option<(String, String)>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: None,
        }
    }

    pub(crate) fn to_reqwest(&self) -> Result<Proxy, CertError> {
        let mut proxy = Proxy::all(&self.url)
            .map_err(|e| CertError::Proxy(format!("{}: {e}", self.url)))?;

        if let Some((username, password)) = &self.auth {
            proxy = proxy.basic_auth(username, password);
        }

        Ok(proxy)
    }
}

/// HTTP options for the certificate fetcher.
///
/// Timeouts default to zero, meaning none: a hung download blocks only its
/// own asset, and the host waits for resolution to finish before starting.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Overall timeout for a single request (zero disables it)
    pub timeout: Duration,

    /// Connection timeout (zero disables it)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Explicit proxy; takes precedence over system proxy settings
    pub proxy: Option<ProxyConfig>,

    /// Whether to honour system proxy settings when no explicit proxy is set
    pub use_system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            connect_timeout: Duration::ZERO,
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            proxy: None,
            use_system_proxy: true,
        }
    }
}

impl FetchConfig {
    pub fn builder() -> crate::builder::FetchConfigBuilder {
        crate::builder::FetchConfigBuilder::new()
    }
}
