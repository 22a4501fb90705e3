//! # Builder for FetchConfig
//!
//! Fluent construction of [`FetchConfig`] values.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use secure_now_engine::{FetchConfig, ProxyConfig};
//!
//! let config = FetchConfig::builder()
//!     .with_timeout(Duration::from_secs(30))
//!     .with_user_agent("my-dev-server/1.0")
//!     .with_proxy(ProxyConfig::new("http://proxy.example.com:8080"))
//!     .build();
//!
//! assert_eq!(config.timeout, Duration::from_secs(30));
//! assert!(!config.use_system_proxy);
//! ```

use std::time::Duration;

use crate::config::{FetchConfig, ProxyConfig};

/// Builder for creating FetchConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    /// Set the overall request timeout; zero disables it
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout; zero disables it
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set an explicit proxy, which overrides system proxy settings
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self.config.use_system_proxy = false;
        self
    }

    /// Set whether to use system proxy settings if available
    pub fn with_system_proxy(mut self, use_system_proxy: bool) -> Self {
        // An explicit proxy always wins
        if self.config.proxy.is_none() {
            self.config.use_system_proxy = use_system_proxy;
        }
        self
    }

    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl Default for FetchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
