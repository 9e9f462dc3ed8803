//! awsinv: multi-account AWS resource inventory
//!
//! Discovers the accounts the caller may assume into, fetches the requested
//! resource types from every account and region, and logs a summary.

use anyhow::{Context, Result, bail};
use awsinv_common::defaults::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_REGION, DEFAULT_STAGGER, DEFAULT_STREAM_CAPACITY,
};
use awsinv_common::{Region, ResourceType};
use awsinv_core::aws::{AwsClientPool, LocalClientPool};
use awsinv_core::cache::{Cache, CacheHandler, FileCache, MemoryCache, MemoryCacheConfig};
use awsinv_core::config::{CacheConfig, Config};
use awsinv_core::gateway::{Gateway, GatewayPool};
use awsinv_core::resources::middleware::{
    LoggerMiddleware, ResourcePoolMiddleware, summary_handler,
};
use awsinv_core::resources::ResourceObserver;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "awsinv")]
#[command(about = "Inventory AWS resources across accounts and regions")]
#[command(version)]
struct Args {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info", env = "AWSINV_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

/// Arguments for the resources command
#[derive(clap::Args, Debug)]
struct ResourcesArgs {
    /// Comma-separated regions to inventory
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_REGION, env = "AWSINV_REGIONS")]
    regions: Vec<String>,

    /// Comma-separated resource types (e.g. AWS::EC2::Instance); all known types if omitted
    #[arg(long, value_delimiter = ',', env = "AWSINV_TYPES")]
    types: Vec<String>,

    /// Directory for the file cache (disabled if not set)
    #[arg(long, env = "AWSINV_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Cache TTL in seconds
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    cache_ttl: u64,

    /// Entries kept in the in-memory cache (0 disables it)
    #[arg(long, default_value_t = 0)]
    memory_cache_entries: usize,

    /// Entities buffered per resource type before new ones are dropped
    #[arg(long, default_value_t = DEFAULT_STREAM_CAPACITY)]
    stream_capacity: usize,

    /// Delay in milliseconds between launching per-gateway fetches
    #[arg(long, default_value_t = DEFAULT_STAGGER.as_millis() as u64)]
    stagger_ms: u64,

    /// Only inventory the caller's own account, without assuming roles
    #[arg(long)]
    local: bool,

    /// Print every resource as JSON to stdout
    #[arg(long)]
    print: bool,
}

impl From<&ResourcesArgs> for Config {
    fn from(args: &ResourcesArgs) -> Self {
        let resource_types = if args.types.is_empty() {
            ResourceType::known()
        } else {
            args.types
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| match t.parse::<ResourceType>() {
                    Ok(parsed) => parsed,
                    Err(never) => match never {},
                })
                .collect()
        };

        Self {
            regions: args
                .regions
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty())
                .map(Region::from)
                .collect(),
            resource_types,
            cache: CacheConfig {
                dir: args.cache_dir.clone(),
                ttl: Duration::from_secs(args.cache_ttl),
                memory_entries: args.memory_cache_entries,
            },
            stream_capacity: args.stream_capacity,
            stagger: Duration::from_millis(args.stagger_ms),
            local: args.local,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch resources from every reachable account and region
    Resources(ResourcesArgs),

    /// List known regions with their descriptions
    Regions,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log level")?
        .add_directive("aws_config=warn".parse()?)
        .add_directive("aws_smithy_runtime=warn".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Resources(resources_args) => {
            let config = Config::from(&resources_args);
            handle_resources(config, resources_args.print).await?;
        }
        Command::Regions => handle_regions(),
    }

    Ok(())
}

/// Handle the resources command
async fn handle_resources(config: Config, print: bool) -> Result<()> {
    if config.regions.is_empty() {
        bail!("No regions given");
    }

    info!(
        regions = ?config.regions,
        types = ?config.resource_types,
        local = config.local,
        cache = config.cache.is_enabled(),
        "Starting inventory"
    );

    let clients = if config.local {
        LocalClientPool::from_env()
            .await
            .get_clients(&config.regions)
            .await
    } else {
        AwsClientPool::from_env()
            .await
            .get_clients(&config.regions)
            .await
            .context("Failed to discover assumable roles")?
    };
    if clients.is_empty() {
        bail!("No usable client for any account and region");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling in-flight fetches");
                cancel.cancel();
            }
        }
    });

    let pool = GatewayPool::from_clients(clients, cancel).await;
    info!(gateways = pool.len(), "Gateways ready");

    let resources = ResourcePoolMiddleware::new();
    if config.cache.is_enabled() {
        let cache = build_cache(&config.cache)?;
        observe(pool.with_cache(&cache), &config, &resources).await?;
    } else {
        observe(pool, &config, &resources).await?;
    }

    if print {
        let all = resources.get_resources();
        println!("{}", serde_json::to_string_pretty(&all)?);
    }

    Ok(())
}

async fn observe<G: Gateway>(
    pool: GatewayPool<G>,
    config: &Config,
    resources: &ResourcePoolMiddleware,
) -> Result<()> {
    let mut observer =
        ResourceObserver::new(pool, summary_handler()).with_provider_config(config.provider());
    observer
        .use_middleware(LoggerMiddleware)
        .use_middleware(resources.clone());

    observer.serve(&config.resource_types).await
}

fn build_cache(config: &CacheConfig) -> Result<Cache> {
    let mut handlers: Vec<Arc<dyn CacheHandler>> = Vec::new();

    if config.memory_entries > 0 {
        handlers.push(Arc::new(MemoryCache::new(MemoryCacheConfig {
            ttl: config.ttl,
            max_entries: config.memory_entries,
        })));
    }
    if let Some(dir) = &config.dir {
        let file = FileCache::new(dir, config.ttl)
            .with_context(|| format!("Cache directory {} is not usable", dir.display()))?;
        handlers.push(Arc::new(file));
    }

    let cache = Cache::new().with_handlers(handlers);
    info!(backends = ?cache.handler_kinds(), ttl_secs = config.ttl.as_secs(), "Cache enabled");
    Ok(cache)
}

/// Handle the regions command
fn handle_regions() {
    println!("{:<16} DESCRIPTION", "REGION");
    println!("{}", "-".repeat(48));
    for region in Region::all() {
        println!(
            "{:<16} {}",
            region.as_str(),
            region.description().unwrap_or_default()
        );
    }
}
