//! # Certificate assets
//!
//! The fixed set of files published by the wildcard certificate service and
//! the map produced when resolving them against the local cache.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Base domain of the certificate service; every `*.traefik.me` name resolves
/// to the IP address embedded in it, or to 127.0.0.1 for plain labels.
pub const TRAEFIK_ME_DOMAIN: &str = "traefik.me";

/// Logical name of a certificate-related file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum AssetName {
    /// Leaf certificate
    Cert,
    /// Private key of the leaf certificate
    Key,
    /// Intermediate chain
    Chain,
    /// Leaf certificate followed by the chain
    #[cfg_attr(feature = "clap", value(name = "fullchain"))]
    FullChain,
}

impl AssetName {
    pub const ALL: [AssetName; 4] = [
        AssetName::Cert,
        AssetName::Key,
        AssetName::Chain,
        AssetName::FullChain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetName::Cert => "cert",
            AssetName::Key => "key",
            AssetName::Chain => "chain",
            AssetName::FullChain => "fullchain",
        }
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical name paired with the URL it is downloaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub name: AssetName,
    pub url: String,
}

impl AssetDescriptor {
    pub fn new(name: AssetName, url: impl Into<String>) -> Self {
        Self {
            name,
            url: url.into(),
        }
    }

    /// The certificate set published on `https://traefik.me`
    pub fn traefik_me() -> Vec<AssetDescriptor> {
        AssetName::ALL
            .iter()
            .map(|&name| {
                let file = match name {
                    AssetName::Cert => "cert.pem",
                    AssetName::Key => "privkey.pem",
                    AssetName::Chain => "chain.pem",
                    AssetName::FullChain => "fullchain.pem",
                };
                AssetDescriptor::new(name, format!("https://{TRAEFIK_ME_DOMAIN}/{file}"))
            })
            .collect()
    }
}

/// Outcome of resolving a set of descriptors.
///
/// Assets whose download failed have no path; the error is kept in
/// [`ResolvedAssets::failures`] instead. Callers must be ready for a partial
/// set.
#[derive(Debug, Default)]
pub struct ResolvedAssets {
    paths: BTreeMap<AssetName, PathBuf>,
    failures: Vec<(AssetName, FetchError)>,
}

impl ResolvedAssets {
    pub(crate) fn insert(&mut self, name: AssetName, path: PathBuf) {
        self.paths.insert(name, path);
    }

    pub(crate) fn record_failure(&mut self, name: AssetName, error: FetchError) {
        self.failures.push((name, error));
    }

    pub fn get(&self, name: AssetName) -> Option<&Path> {
        self.paths.get(&name).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: AssetName) -> bool {
        self.paths.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetName, &Path)> {
        self.paths.iter().map(|(name, path)| (*name, path.as_path()))
    }

    pub fn failures(&self) -> &[(AssetName, FetchError)] {
        &self.failures
    }

    /// Certificate and key paths, when both resolved
    pub fn cert_and_key(&self) -> Option<(&Path, &Path)> {
        Some((self.get(AssetName::Cert)?, self.get(AssetName::Key)?))
    }
}
