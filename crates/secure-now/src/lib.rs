//! # secure-now
//!
//! Locally trusted HTTPS for development and preview servers.
//!
//! The engine downloads the public `traefik.me` wildcard certificate set,
//! keeps it in an on-disk cache that expires after a day, and wires the
//! resulting PEM paths into a host server's TLS configuration. Once the host
//! is listening, its URL printer is decorated with the secure
//! `https://<prefix>.traefik.me:<port>` address.
//!
//! ## Features
//!
//! - SHA-256 named cache entries with a 24 hour expiry
//! - Concurrent, failure tolerant resolution of the certificate set
//! - Streaming downloads that never leave partial files behind
//! - A small plugin interface for dev/preview host servers

pub mod assets;
pub mod builder;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod host;
pub mod resolver;

pub use assets::{AssetDescriptor, AssetName, ResolvedAssets, TRAEFIK_ME_DOMAIN};
pub use builder::FetchConfigBuilder;
pub use cache::{CacheConfig, CacheEntry, CertCache, Clock, ExpiryPolicy, SystemClock, derive_key};
pub use client::create_client;
pub use config::{DEFAULT_PREFIX, FetchConfig, ProxyConfig, SecureNowOptions};
pub use error::{CertError, FetchError};
pub use fetcher::{AssetFetcher, HttpFetcher};
pub use host::{
    BoundAddr, HostLogger, HostServer, HttpsConfig, HttpsSetting, Plugin, ResolvedConfig,
    SecureNowPlugin, ServerKind, ServerOptions, TracingLogger, UrlPrinter, secure_url_line,
};
pub use resolver::CertificateResolver;
