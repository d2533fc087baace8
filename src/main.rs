//! Rick and Morty mirror - serve a cached projection of the character API

use clap::Parser;

use rickandmorty_mirror::cli::{Cli, ServiceConfig};
use rickandmorty_mirror::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match ServiceConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = server::run(config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
