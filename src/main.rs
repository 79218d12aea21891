//! arenad - arena combat daemon

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use arenad::{Config, Server};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Arena combat daemon
#[derive(Parser, Debug)]
#[command(name = "arenad", version, about = "Run the arena chat room")]
struct Args {
    /// TOML config file (defaults to ./arenad.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Fixed RNG seed for reproducible fights
    #[arg(long)]
    seed: Option<u64>,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "arenad=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.log_json |= args.log_json;

    init_tracing(config.log_json);

    let server = Arc::new(Server::new(config)?);
    let runner = server.clone();
    let mut handle = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        joined = &mut handle => {
            if let Err(e) = joined? {
                error!("arenad failed: {:#}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            server.shutdown();
            handle.await??;
        }
    }

    Ok(())
}
