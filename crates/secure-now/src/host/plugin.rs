use async_trait::async_trait;
use colored::Colorize;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{HostServer, Plugin, ResolvedConfig};
use crate::assets::{AssetDescriptor, TRAEFIK_ME_DOMAIN};
use crate::cache::CacheConfig;
use crate::config::{FetchConfig, SecureNowOptions};
use crate::error::CertError;
use crate::resolver::CertificateResolver;

pub const PLUGIN_NAME: &str = "secure-now";

/// Format the line announcing the secure URL of a server.
///
/// `https` selects the scheme of the local address the secure URL maps to.
pub fn secure_url_line(domain: &str, port: u16, https: bool, colors: bool) -> String {
    let secure = format!("https://{domain}:{port}");
    let local = format!("{}://localhost:{port}", if https { "https" } else { "http" });

    if !colors {
        return format!("  ➜  Secure: {secure} -> {local}");
    }

    format!(
        "{}{}{}{}{}",
        "  ➜".bright_green(),
        "  Secure: ".bright_white().bold(),
        secure.yellow(),
        " -> ".cyan(),
        local.yellow(),
    )
}

/// Serves dev and preview servers over HTTPS with the `traefik.me`
/// wildcard certificate.
pub struct SecureNowPlugin {
    options: SecureNowOptions,
    resolver: CertificateResolver,
    descriptors: Vec<AssetDescriptor>,
    colors: bool,
    serving_domain: Mutex<Option<String>>,
}

impl SecureNowPlugin {
    /// Plugin using the default cache location and an HTTP fetcher
    pub fn new(options: SecureNowOptions) -> Result<Self, CertError> {
        let resolver =
            CertificateResolver::with_http(&CacheConfig::default(), &FetchConfig::default())?;
        Ok(Self::with_resolver(options, resolver))
    }

    pub fn with_resolver(options: SecureNowOptions, resolver: CertificateResolver) -> Self {
        Self {
            options,
            resolver,
            descriptors: AssetDescriptor::traefik_me(),
            colors: true,
            serving_domain: Mutex::new(None),
        }
    }

    /// Resolve a different certificate set; it must contain a cert and a key
    pub fn with_descriptors(mut self, descriptors: Vec<AssetDescriptor>) -> Self {
        self.descriptors = descriptors;
        self
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn options(&self) -> &SecureNowOptions {
        &self.options
    }

    /// Domain the servers are reachable at, once HTTPS was configured
    pub fn serving_domain(&self) -> Option<String> {
        self.serving_domain.lock().clone()
    }

    fn decorate(&self, server: &mut HostServer) {
        let Some(domain) = self.serving_domain() else {
            return;
        };
        let Some(listener) = server.listener().cloned() else {
            debug!(kind = ?server.kind(), "Server has no HTTP listener, not printing secure URL");
            return;
        };

        let logger = server.logger();
        let https = server.https_enabled();
        let colors = self.colors;

        server.wrap_url_printer(move |original| {
            Box::new(move || {
                original();
                if let Some(addr) = listener.get() {
                    logger.info(&secure_url_line(&domain, addr.port(), https, colors));
                }
            })
        });
    }
}

#[async_trait]
impl Plugin for SecureNowPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn config_resolved(&self, config: &mut ResolvedConfig) -> Result<(), CertError> {
        let resolved = self.resolver.resolve(&self.descriptors).await?;

        let Some((cert, key)) = resolved.cert_and_key() else {
            warn!(
                failed = resolved.failures().len(),
                "Certificate or key unavailable, leaving HTTPS configuration unchanged"
            );
            return Ok(());
        };

        let mut set_https = false;
        if self.options.dev && config.server.apply_certificate(cert, key) {
            set_https = true;
        }
        if self.options.preview && config.preview.apply_certificate(cert, key) {
            set_https = true;
        }

        if set_https {
            let domain = format!("{}.{TRAEFIK_ME_DOMAIN}", self.options.prefix);
            info!(domain = %domain, "HTTPS enabled with traefik.me certificate");
            *self.serving_domain.lock() = Some(domain);
        }

        Ok(())
    }

    fn configure_server(&self, server: &mut HostServer) {
        self.decorate(server);
    }

    fn configure_preview_server(&self, server: &mut HostServer) {
        self.decorate(server);
    }
}

impl std::fmt::Debug for SecureNowPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureNowPlugin")
            .field("options", &self.options)
            .field("descriptors", &self.descriptors)
            .field("serving_domain", &self.serving_domain())
            .finish_non_exhaustive()
    }
}
