//! # Host Integration
//!
//! The surface a development/preview server exposes to plugins: its resolved
//! configuration, the servers it starts and the hooks it calls.

mod plugin;

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::CertError;

pub use plugin::{SecureNowPlugin, secure_url_line};

/// Address every interface listens on
pub const ALL_INTERFACES: &str = "0.0.0.0";

/// Prints the URLs a server is reachable at
pub type UrlPrinter = Box<dyn Fn() + Send + Sync>;

/// Console output of the host
pub trait HostLogger: Send + Sync {
    fn info(&self, msg: &str);
}

/// Logger that forwards host output to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl HostLogger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }
}

/// TLS material for a server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpsConfig {
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub ca: Option<PathBuf>,
    pub passphrase: Option<String>,
}

/// HTTPS state of a server as configured by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HttpsSetting {
    /// Not configured; plugins may enable it
    #[default]
    Unset,
    /// Explicitly turned off; plugins must leave it alone
    Disabled,
    Enabled(HttpsConfig),
}

impl HttpsSetting {
    pub fn is_enabled(&self) -> bool {
        matches!(self, HttpsSetting::Enabled(_))
    }

    pub fn config(&self) -> Option<&HttpsConfig> {
        match self {
            HttpsSetting::Enabled(config) => Some(config),
            _ => None,
        }
    }
}

/// Options of the development or preview server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOptions {
    pub https: HttpsSetting,
    /// Interface to bind; `None` means loopback
    pub host: Option<String>,
}

impl ServerOptions {
    /// Point the server's TLS config at `cert` and `key` and listen on all
    /// interfaces.
    ///
    /// Other TLS fields the user set are kept. Returns false, changing
    /// nothing, when HTTPS was explicitly disabled.
    pub fn apply_certificate(&mut self, cert: &Path, key: &Path) -> bool {
        let mut config = match &self.https {
            HttpsSetting::Disabled => return false,
            HttpsSetting::Unset => HttpsConfig::default(),
            HttpsSetting::Enabled(existing) => existing.clone(),
        };

        config.cert = Some(cert.to_path_buf());
        config.key = Some(key.to_path_buf());
        self.https = HttpsSetting::Enabled(config);
        self.host = Some(ALL_INTERFACES.to_owned());
        true
    }
}

/// Host configuration after all user and plugin config was merged
pub struct ResolvedConfig {
    pub server: ServerOptions,
    pub preview: ServerOptions,
    pub logger: Arc<dyn HostLogger>,
}

impl ResolvedConfig {
    pub fn new(logger: Arc<dyn HostLogger>) -> Self {
        Self {
            server: ServerOptions::default(),
            preview: ServerOptions::default(),
            logger,
        }
    }

    /// Whether either server was configured for HTTPS
    pub fn https_enabled(&self) -> bool {
        self.server.https.is_enabled() || self.preview.https.is_enabled()
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("server", &self.server)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    Dev,
    Preview,
}

/// Address of a listening HTTP server, filled in once it has bound
#[derive(Debug, Clone, Default)]
pub struct BoundAddr(Arc<RwLock<Option<SocketAddr>>>);

impl BoundAddr {
    pub fn set(&self, addr: SocketAddr) {
        *self.0.write() = Some(addr);
    }

    pub fn get(&self) -> Option<SocketAddr> {
        *self.0.read()
    }
}

/// A dev or preview server started by the host
pub struct HostServer {
    kind: ServerKind,
    https_enabled: bool,
    logger: Arc<dyn HostLogger>,
    listener: Option<BoundAddr>,
    print_urls: UrlPrinter,
}

impl HostServer {
    /// Server without its own HTTP listener (middleware mode)
    pub fn new(kind: ServerKind, config: &ResolvedConfig, print_urls: UrlPrinter) -> Self {
        Self {
            kind,
            https_enabled: config.https_enabled(),
            logger: config.logger.clone(),
            listener: None,
            print_urls,
        }
    }

    pub fn with_listener(mut self, listener: BoundAddr) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn kind(&self) -> ServerKind {
        self.kind
    }

    pub fn https_enabled(&self) -> bool {
        self.https_enabled
    }

    pub fn logger(&self) -> Arc<dyn HostLogger> {
        self.logger.clone()
    }

    pub fn listener(&self) -> Option<&BoundAddr> {
        self.listener.as_ref()
    }

    pub fn print_urls(&self) {
        (self.print_urls)()
    }

    /// Replace the URL printer with one built from the current printer
    pub fn wrap_url_printer(&mut self, wrap: impl FnOnce(UrlPrinter) -> UrlPrinter) {
        let original = std::mem::replace(&mut self.print_urls, Box::new(|| {}));
        self.print_urls = wrap(original);
    }
}

/// Extension points the host calls into, in this order: `config_resolved`
/// once, then `configure_server` or `configure_preview_server` for each
/// server it creates.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once the host configuration is final; may mutate it
    async fn config_resolved(&self, config: &mut ResolvedConfig) -> Result<(), CertError>;

    fn configure_server(&self, _server: &mut HostServer) {}

    fn configure_preview_server(&self, _server: &mut HostServer) {}
}
