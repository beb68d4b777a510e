//! Weebcast snapshot gateway entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weebcast_gateway::api::{self, create_router, AppState, SyncAuth};
use weebcast_gateway::config::Config;
use weebcast_gateway::metrics;
use weebcast_gateway::season::current_season;
use weebcast_gateway::store;
use weebcast_gateway::utils::shutdown_signal;

/// HTTP gateway for cached anime-activity snapshots.
#[derive(Parser, Debug)]
#[command(name = "weebcast-gateway")]
#[command(about = "Serve anime-activity snapshots from a key-value store")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print the current anime season label.
    Season,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let config = Config::load()?;

    // Initialize logging
    let filter = if args.verbose || config.verbose {
        EnvFilter::new("weebcast_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    tracing_subscriber::registry()
        .with(config.log_json.then(|| fmt::layer().json()))
        .with((!config.log_json).then(|| fmt::layer()))
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::Season) => {
            println!("{}", current_season());
            Ok(())
        }
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        None => cmd_serve(config, args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("WEEBCAST GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    if let Err(e) = config.validate() {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed"));
    }
    println!("OK");

    print!("Building store client... ");
    if let Err(e) = store::from_config(&config) {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(anyhow::anyhow!("Store configuration invalid"));
    }
    println!("OK");

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Store Backend: {}", config.store_backend);
    if let Some(namespace) = &config.cloudflare_namespace_id {
        println!("  KV Namespace: {}", namespace);
    }
    println!("  List Page Size: {}", config.kv_list_page_size);
    println!(
        "  Sync Auth: {}",
        if config.sync_requires_token() { "Bearer token" } else { "OPEN" }
    );
    match config.metrics_port {
        Some(port) => println!("  Metrics Port: {}", port),
        None => println!("  Metrics: Disabled"),
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP gateway until shutdown.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }

    let config = config.validated().inspect_err(|e| {
        error!("{}", e);
    })?;

    if let Some(port) = config.metrics_port {
        metrics::install_exporter(port)?;
    }

    let store = store::from_config(&config)?;
    info!("Store backend: {}", config.store_backend);

    let sync_auth = SyncAuth::from_token(config.sync_token.as_deref());
    if sync_auth.is_open() {
        warn!("POST /api/sync is open to any caller; set SYNC_TOKEN to require a bearer token");
    }

    let app_state = AppState::new(store).with_sync_auth(sync_auth);
    let router = create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    api::serve(addr, router, shutdown_signal()).await?;

    info!("Gateway stopped");
    Ok(())
}
