use clap::Parser;
use secure_now_engine::CacheConfig;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod commands;
mod config;
mod error;
mod utils;

use cli::{CliArgs, Command};
use commands::Context;
use config::FileConfig;
use error::AppError;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "secure-now failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let file_config = FileConfig::load(args.config.as_deref())?;
    let colors = !args.no_color && file_config.colors.unwrap_or(true);
    if !colors {
        colored::control::set_override(false);
    }

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(colors)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let mut cache_config = CacheConfig::default();
    if let Some(dir) = args.cache_dir.or(file_config.cache_dir) {
        cache_config = cache_config.with_cache_dir(dir);
    }

    let ctx = Context {
        cache_config,
        prefix: file_config.plugin.prefix,
        timeout: file_config.timeout,
        proxy: file_config.proxy,
    };

    match args.command {
        Command::Fetch(fetch_args) => commands::fetch(ctx, fetch_args).await,
        Command::Show => commands::show(ctx).await,
        Command::Clean => commands::clean(ctx).await,
    }
}
