use std::{path::PathBuf, time::Duration};

use clap::Parser;
use postbox_common::{Signal, config::Config, logging};
use postbox_http::HttpServer;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "postbox", about = "Mail fan-out backend", version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./postbox.config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        Config::from_file(&args.config)?
    } else {
        warn!(path = %args.config.display(), "Config file not found, using defaults");
        Config::default()
    };

    let state = postbox::build_state(&config)?;
    let router = postbox_http::router(
        state,
        Duration::from_secs(config.http.request_timeout_secs),
    );
    let server = HttpServer::bind(&config.http.listen_address, router).await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            let _ = shutdown_tx.send(Signal::Shutdown);
        }
    });

    server.serve(shutdown_rx).await?;
    Ok(())
}
