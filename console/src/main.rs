use clap::{Parser, Subcommand};
use console::api::{AppState, router};
use console::backend::SchemaApi;
use console::backend::http::HttpApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "console", about = "SchemaConsole: database schema and metrics console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the console server (default)
    Serve,
    /// Check backend connectivity and exit
    Ping,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init structured logging (respects RUST_LOG; defaults to info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let backend_url =
        std::env::var("SC_BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:10080".to_string());
    let metrics_url = std::env::var("SC_METRICS_URL").unwrap_or_else(|_| backend_url.clone());
    let timeout_secs: u64 = std::env::var("SC_BACKEND_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    tracing::info!(backend = %backend_url, metrics = %metrics_url, "using backend");

    let api = Arc::new(HttpApi::new(
        &backend_url,
        &metrics_url,
        Duration::from_secs(timeout_secs),
    )?);

    match cli.command {
        None | Some(Commands::Serve) => serve(api).await?,
        Some(Commands::Ping) => ping(api).await?,
    }

    Ok(())
}

async fn serve(api: Arc<HttpApi>) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr =
        std::env::var("SC_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8440".to_string());
    let ui_dir = std::env::var("SC_UI_DIR")
        .unwrap_or_else(|_| "/usr/local/share/console-ui".to_string());

    let state = AppState::new(api.clone(), api, ui_dir);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Console online");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn ping(api: Arc<HttpApi>) -> Result<(), Box<dyn std::error::Error>> {
    let databases = api.databases().await?;
    tracing::info!(count = databases.len(), "Backend reachable");
    Ok(())
}
