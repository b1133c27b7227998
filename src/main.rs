mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use resizing_worker::{
    api::{self, AppState},
    config::Config,
    observability::{self, Metrics},
    shutdown, watcher,
    worker::Processor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    observability::init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    match cli.command {
        Commands::Watcher => {
            let summary = watcher::run(&config, shutdown::token()).await?;
            info!(workers = summary.workers.len(), "Exiting");
        }
        Commands::Httpserver(args) => {
            let address = args
                .address
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], config.server.port)));
            let storage = watcher::build_storage(&config)?;
            let processor = Processor::new(storage, Arc::new(Metrics::new()));
            let state = AppState::new(processor, config.server.max_payload_bytes.as_usize());
            api::run(address, state).await?;
        }
    }

    Ok(())
}
