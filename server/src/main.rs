// Pixie Interview Server
// Main entry point for the pixie-server binary

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::info;

use pixie_engine::config::Config;
use pixie_server::cli;
use pixie_server::handlers::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "pixie-server", about = "Pixie mock-interview API server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a terminal interview against a running server
    Interview {
        /// Base URL of the server to interview against
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment-based configuration
    // Default to INFO level if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Some(Commands::Interview { server }) = cli.command {
        return cli::run_interview(&server).await;
    }

    let config = Config::from_env();
    info!("Starting Pixie interview server on port {}", config.port);
    if config.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; interview endpoints will return errors");
    }

    let state = AppState::new();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down gracefully");
        })
        .await?;

    Ok(())
}
