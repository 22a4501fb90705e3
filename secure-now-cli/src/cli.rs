use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secure_now_engine::AssetName;

/// Define CLI arguments
#[derive(Debug, Parser)]
#[command(
    version,
    about = "Locally trusted HTTPS certificates for development servers",
    long_about = "Downloads the public traefik.me wildcard certificate set into a local cache,\n\
                  refreshing it once a day, so development and preview servers can be served\n\
                  over HTTPS at https://<prefix>.traefik.me."
)]
pub struct CliArgs {
    /// Certificate cache directory
    #[arg(
        long,
        global = true,
        help = "Directory holding cached certificates (default: node_modules/.vite/traefik.me)"
    )]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the certificate set, downloading whatever is missing or outdated
    Fetch(FetchArgs),
    /// List cached certificate files with their age
    Show,
    /// Remove every cached certificate file
    Clean,
}

#[derive(Debug, clap::Args)]
pub struct FetchArgs {
    /// Only resolve these assets
    #[arg(short, long = "asset", value_enum, help = "Asset to resolve; repeat for several (default: all)")]
    pub assets: Vec<AssetName>,

    /// Subdomain label of the serving domain
    #[arg(short, long, help = "Subdomain used to build <prefix>.traefik.me")]
    pub prefix: Option<String>,

    /// Request timeout with optional unit (s, m, h)
    #[arg(
        long,
        help = "Overall timeout for each download with optional unit (s, m, h). Use 0 for none."
    )]
    pub timeout: Option<String>,

    /// Proxy for downloads
    #[arg(long, help = "Proxy URL for downloads (http, https or socks5)")]
    pub proxy: Option<String>,

    /// Ignore system proxy settings
    #[arg(long, help = "Disable all proxy settings, including system proxies")]
    pub no_proxy: bool,
}
