use std::sync::Arc;

use reqwest::Client;
use rustls::{ClientConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::CertError;

/// Create a reqwest Client with the provided configuration.
///
/// TLS is handled by rustls with the platform certificate verifier, so the
/// certificate service is trusted exactly as the OS trusts it.
pub fn create_client(config: &FetchConfig) -> Result<Client, CertError> {
    let provider = Arc::new(ring::default_provider());

    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_platform_verifier()?
        .with_no_client_auth();

    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .use_preconfigured_tls(tls_config)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if let Some(proxy_config) = &config.proxy {
        client_builder = client_builder.proxy(proxy_config.to_reqwest()?);
        info!(proxy_url = %proxy_config.url, "Using explicitly configured proxy for certificate downloads");
    } else if config.use_system_proxy {
        debug!("Using system proxy settings for certificate downloads");
    } else {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled for certificate downloads");
    }

    client_builder.build().map_err(CertError::from)
}
