use std::time::Duration;

use colored::Colorize;
use secure_now_engine::{
    AssetDescriptor, CacheConfig, CertCache, CertificateResolver, FetchConfig, ProxyConfig,
    TRAEFIK_ME_DOMAIN,
};
use tracing::{debug, info};

use crate::cli::FetchArgs;
use crate::error::AppError;
use crate::utils::{format_bytes, format_duration, parse_time};

/// Everything a command needs, after merging the config file with flags
pub struct Context {
    pub cache_config: CacheConfig,
    pub prefix: String,
    pub timeout: Option<String>,
    pub proxy: Option<String>,
}

pub async fn fetch(ctx: Context, args: FetchArgs) -> Result<(), AppError> {
    let prefix = args.prefix.unwrap_or(ctx.prefix);

    let timeout = match args.timeout.or(ctx.timeout) {
        Some(value) => parse_time(&value)?,
        None => Duration::ZERO,
    };

    let mut builder = FetchConfig::builder().with_timeout(timeout);
    if args.no_proxy {
        info!("All proxy settings disabled (--no-proxy flag)");
        builder = builder.with_system_proxy(false);
    } else if let Some(proxy) = args.proxy.or(ctx.proxy) {
        builder = builder.with_proxy(ProxyConfig::new(proxy));
    }
    let fetch_config = builder.build();

    let descriptors: Vec<AssetDescriptor> = AssetDescriptor::traefik_me()
        .into_iter()
        .filter(|d| args.assets.is_empty() || args.assets.contains(&d.name))
        .collect();
    debug!(count = descriptors.len(), "Resolving certificate assets");

    let resolver = CertificateResolver::with_http(&ctx.cache_config, &fetch_config)?;
    let resolved = resolver.resolve(&descriptors).await?;

    for (name, path) in resolved.iter() {
        println!("{:<10} {}", name.to_string().green(), path.display());
    }
    for (name, error) in resolved.failures() {
        println!("{:<10} {}", name.to_string().red(), error);
    }

    if resolved.cert_and_key().is_some() {
        println!();
        println!(
            "{} {}",
            "Serving domain:".bold(),
            format!("https://{}.{TRAEFIK_ME_DOMAIN}", prefix).yellow()
        );
    }

    if resolved.failures().is_empty() {
        Ok(())
    } else {
        Err(AppError::Incomplete(resolved.failures().len(), descriptors.len()))
    }
}

pub async fn show(ctx: Context) -> Result<(), AppError> {
    let cache = CertCache::new(&ctx.cache_config);
    let entries = cache.entries().await?;

    if entries.is_empty() {
        println!("No cached certificates in {}", cache.dir().display());
        return Ok(());
    }

    println!("{}", cache.dir().display().to_string().bold());
    for entry in entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let age = cache
            .policy()
            .age(&entry)
            .map(format_duration)
            .unwrap_or_else(|| "-".to_string());
        let state = if cache.policy().is_stale(&entry) {
            "stale".red()
        } else {
            "fresh".green()
        };

        println!(
            "  {name}  {:>10}  {:>8}  {state}",
            format_bytes(entry.size),
            age
        );
    }

    Ok(())
}

pub async fn clean(ctx: Context) -> Result<(), AppError> {
    let cache = CertCache::new(&ctx.cache_config);
    let removed = cache.clear().await?;
    println!("Removed {removed} cached file(s) from {}", cache.dir().display());
    Ok(())
}
