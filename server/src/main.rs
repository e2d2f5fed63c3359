use std::{net::SocketAddr, path::PathBuf, time::Duration};

use axum_server::Handle as ServerHandle;
use clap::Parser;
use tapintu::{router, Config, Services};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Serves the beneficiary feed of followed Hive blogs.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file with a `[global]` table.
    #[arg(short, long, env = "TAPINTU_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("It looks like your config is invalid. The following error occurred: {e}");
            std::process::exit(1);
        }
    };

    let filter_layer = match EnvFilter::try_new(&config.log) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("It looks like your log config is invalid. The following error occurred: {e}");
            EnvFilter::new("warn")
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = config.validate() {
        eprintln!("It looks like your config is invalid. The following error occurred: {e}");
        std::process::exit(1);
    }

    info!("{}", config);

    if let Err(error) = run_server(config).await {
        tracing::error!("Critical error running server: {}", error);
        std::process::exit(1);
    }
}

async fn run_server(config: Config) -> std::io::Result<()> {
    let addr = SocketAddr::from((config.address, config.port));

    let services = Services::build(config).map_err(std::io::Error::other)?;
    let app = router(services);

    let handle = ServerHandle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    info!("Tapintu listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn shutdown_signal(handle: ServerHandle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let sig: &str;

    tokio::select! {
        _ = ctrl_c => { sig = "Ctrl+C"; },
        _ = terminate => { sig = "SIGTERM"; },
    }

    warn!("Received {}, shutting down...", sig);
    handle.graceful_shutdown(Some(Duration::from_secs(30)));
}
