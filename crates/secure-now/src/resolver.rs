//! # Certificate Set Resolver
//!
//! Maps each asset descriptor to a local file, reusing fresh cache entries
//! and downloading the rest. Assets are resolved concurrently and
//! independently: a failed download drops that asset from the result and
//! nothing else.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::assets::{AssetDescriptor, AssetName, ResolvedAssets};
use crate::cache::{CacheConfig, CertCache};
use crate::config::FetchConfig;
use crate::error::{CertError, FetchError};
use crate::fetcher::{AssetFetcher, HttpFetcher};

/// Resolves certificate assets against the local cache
#[derive(Clone)]
pub struct CertificateResolver {
    cache: CertCache,
    fetcher: Arc<dyn AssetFetcher>,
}

impl CertificateResolver {
    pub fn new(cache: CertCache, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Resolver with an HTTP fetcher built from `fetch_config`
    pub fn with_http(
        cache_config: &CacheConfig,
        fetch_config: &FetchConfig,
    ) -> Result<Self, CertError> {
        let fetcher = HttpFetcher::new(fetch_config)?;
        Ok(Self::new(CertCache::new(cache_config), Arc::new(fetcher)))
    }

    pub fn cache(&self) -> &CertCache {
        &self.cache
    }

    /// Resolve every descriptor to a local path.
    ///
    /// Only a failure to create the cache directory is returned as an error,
    /// and in that case no download is attempted. Download failures are
    /// logged and recorded on the result.
    pub async fn resolve(
        &self,
        descriptors: &[AssetDescriptor],
    ) -> Result<ResolvedAssets, CertError> {
        self.cache.ensure_dir().await?;

        let outcomes = join_all(descriptors.iter().map(|d| self.resolve_one(d))).await;

        let mut resolved = ResolvedAssets::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(path) => resolved.insert(name, path),
                Err(e) => resolved.record_failure(name, e),
            }
        }

        debug!(
            resolved = resolved.len(),
            failed = resolved.failures().len(),
            dir = ?self.cache.dir(),
            "Resolved certificate set"
        );
        Ok(resolved)
    }

    async fn resolve_one(
        &self,
        descriptor: &AssetDescriptor,
    ) -> (AssetName, Result<PathBuf, FetchError>) {
        let path = self.cache.entry_path(descriptor);

        if let Some(entry) = self.cache.fresh_entry(&path).await {
            return (descriptor.name, Ok(entry.path));
        }

        info!("Fetching: {}...", descriptor.url);
        match self.fetcher.fetch(&descriptor.url, &path).await {
            Ok(()) => (descriptor.name, Ok(path)),
            Err(e) => {
                error!(asset = %descriptor.name, "{e}");
                (descriptor.name, Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    fn http_fetcher() -> Arc<dyn AssetFetcher> {
        let config = FetchConfig::builder().with_system_proxy(false).build();
        Arc::new(HttpFetcher::new(&config).expect("client"))
    }

    fn descriptors(server: &MockServer) -> Vec<AssetDescriptor> {
        AssetName::ALL
            .iter()
            .map(|&name| AssetDescriptor::new(name, format!("{}/{name}.pem", server.uri())))
            .collect()
    }

    async fn mount_pem(server: &MockServer, name: &str, body: &str, expected_hits: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/{name}.pem")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_hits)
            .mount(server)
            .await;
    }

    /// Log sink shared between a test and its subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Counts calls and refuses to download anything
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetFetcher for CountingFetcher {
        async fn fetch(&self, url: &str, _destination: &std::path::Path) -> Result<(), FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Status {
                url: url.to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    #[tokio::test]
    async fn second_resolve_hits_cache() {
        init_tracing();
        let server = MockServer::start().await;
        for name in ["cert", "key", "chain", "fullchain"] {
            mount_pem(&server, name, &format!("{name} pem"), 1).await;
        }

        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let resolver = CertificateResolver::new(CertCache::new(&config), http_fetcher());
        let descriptors = descriptors(&server);

        let first = resolver.resolve(&descriptors).await.unwrap();
        assert_eq!(first.len(), 4);
        assert!(first.failures().is_empty());

        let second = resolver.resolve(&descriptors).await.unwrap();
        assert_eq!(second.len(), 4);
        for name in AssetName::ALL {
            assert_eq!(first.get(name), second.get(name));
        }

        let key = std::fs::read_to_string(second.get(AssetName::Key).unwrap()).unwrap();
        assert_eq!(key, "key pem");

        // Each mock expects exactly one hit
        server.verify().await;
    }

    #[tokio::test]
    async fn one_failed_asset_is_omitted() {
        init_tracing();
        let server = MockServer::start().await;
        for name in ["cert", "key", "fullchain"] {
            mount_pem(&server, name, name, 1).await;
        }
        Mock::given(method("GET"))
            .and(path("/chain.pem"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let resolver = CertificateResolver::new(CertCache::new(&config), http_fetcher());

        let resolved = resolver.resolve(&descriptors(&server)).await.unwrap();
        assert_eq!(resolved.len(), 3);
        assert!(!resolved.contains(AssetName::Chain));
        assert!(resolved.contains(AssetName::Cert));
        assert!(resolved.contains(AssetName::Key));
        assert!(resolved.contains(AssetName::FullChain));

        let failures = resolved.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, AssetName::Chain);
        assert_eq!(failures[0].1.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

        // The failed asset leaves nothing behind in the cache
        let cache = resolver.cache();
        let chain_path = cache.entry_path(&descriptors(&server)[2]);
        assert!(!chain_path.exists());
    }

    #[tokio::test]
    async fn unusable_cache_dir_is_fatal_and_fetches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let config = CacheConfig::default().with_cache_dir(blocker.join("certs"));
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = CertificateResolver::new(CertCache::new(&config), fetcher.clone());

        let result = resolver.resolve(&AssetDescriptor::traefik_me()).await;
        assert!(matches!(result, Err(CertError::CacheDir { .. })));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cert_ok_key_missing() {
        init_tracing();
        let server = MockServer::start().await;
        mount_pem(&server, "cert", "CERT", 1).await;
        Mock::given(method("GET"))
            .and(path("/key.pem"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let resolver = CertificateResolver::new(CertCache::new(&config), http_fetcher());

        let key_url = format!("{}/key.pem", server.uri());
        let descriptors = vec![
            AssetDescriptor::new(AssetName::Cert, format!("{}/cert.pem", server.uri())),
            AssetDescriptor::new(AssetName::Key, key_url.clone()),
        ];

        let resolved = resolver.resolve(&descriptors).await.unwrap();
        assert_eq!(resolved.len(), 1);
        let cert = resolved.get(AssetName::Cert).unwrap();
        assert_eq!(std::fs::read_to_string(cert).unwrap(), "CERT");
        assert!(resolved.get(AssetName::Key).is_none());
        assert!(resolved.cert_and_key().is_none());

        let failures = resolved.failures();
        assert_eq!(failures.len(), 1);
        let (name, err) = &failures[0];
        assert_eq!(*name, AssetName::Key);
        assert_eq!(err.url(), key_url);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn failed_asset_logs_one_error_line() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .with_writer(move || sink.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start().await;
        mount_pem(&server, "cert", "CERT", 1).await;
        Mock::given(method("GET"))
            .and(path("/key.pem"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let resolver = CertificateResolver::new(CertCache::new(&config), http_fetcher());

        let key_url = format!("{}/key.pem", server.uri());
        let descriptors = vec![
            AssetDescriptor::new(AssetName::Cert, format!("{}/cert.pem", server.uri())),
            AssetDescriptor::new(AssetName::Key, key_url.clone()),
        ];
        let resolved = resolver.resolve(&descriptors).await.unwrap();
        assert!(resolved.contains(AssetName::Cert));

        let errors: Vec<String> = logs
            .lines()
            .into_iter()
            .filter(|line| line.contains("ERROR"))
            .collect();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains(&key_url));
        assert!(errors[0].contains("404"));
    }

    #[tokio::test]
    async fn interrupted_download_is_not_cached() {
        init_tracing();

        // Announces a body it never finishes sending
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n-----BEGIN CERT")
                        .await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });

        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let descriptor = AssetDescriptor::new(AssetName::Cert, format!("http://{addr}/cert.pem"));
        let resolver = CertificateResolver::new(CertCache::new(&config), http_fetcher());

        let task = {
            let resolver = resolver.clone();
            let descriptors = vec![descriptor.clone()];
            tokio::spawn(async move { resolver.resolve(&descriptors).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let cached = resolver.cache().entry_path(&descriptor);
        assert!(!cached.exists());
        assert_eq!(std::fs::read_dir(resolver.cache().dir()).unwrap().count(), 0);

        // The next run has nothing to reuse and downloads again
        let fetcher = Arc::new(CountingFetcher::default());
        let retry = CertificateResolver::new(CertCache::new(&config), fetcher.clone());
        let resolved = retry.resolve(&[descriptor]).await.unwrap();
        assert!(!resolved.contains(AssetName::Cert));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entry_is_refetched() {
        init_tracing();
        let server = MockServer::start().await;
        mount_pem(&server, "cert", "NEW CERT", 1).await;

        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let descriptor = AssetDescriptor::new(AssetName::Cert, format!("{}/cert.pem", server.uri()));

        // Seed the cache with an old copy, then look at it 25 hours later
        let cache = CertCache::new(&config);
        cache.ensure_dir().await.unwrap();
        let cached = cache.entry_path(&descriptor);
        std::fs::write(&cached, "OLD CERT").unwrap();

        let later = SystemTime::now() + Duration::from_secs(25 * 60 * 60);
        let resolver =
            CertificateResolver::new(CertCache::with_clock(&config, Arc::new(later)), http_fetcher());

        let resolved = resolver.resolve(std::slice::from_ref(&descriptor)).await.unwrap();
        let path = resolved.get(AssetName::Cert).unwrap();
        assert_eq!(path, cached.as_path());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "NEW CERT");
    }

    #[tokio::test]
    async fn fresh_entry_skips_network() {
        let tmp = tempfile::tempdir().unwrap();
        let config = CacheConfig::default().with_cache_dir(tmp.path().join("certs"));
        let fetcher = Arc::new(CountingFetcher::default());
        let resolver = CertificateResolver::new(CertCache::new(&config), fetcher.clone());

        let descriptor = AssetDescriptor::new(AssetName::Key, "https://traefik.me/privkey.pem");
        resolver.cache().ensure_dir().await.unwrap();
        std::fs::write(resolver.cache().entry_path(&descriptor), "KEY").unwrap();

        let resolved = resolver.resolve(&[descriptor]).await.unwrap();
        assert!(resolved.contains(AssetName::Key));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
