use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use postbox_blacklist::{BlacklistServer, BlacklistStore};
use postbox_common::{Signal, config::Config, logging};
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "postbox-blacklistd",
    about = "URL blacklist service for the Postbox mail backend",
    version
)]
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

    let store = Arc::new(BlacklistStore::new(
        config.blacklist.filter_bits,
        config.blacklist.filter_hashes,
    ));
    let server = BlacklistServer::bind(&config.blacklist.address, store).await?;

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
