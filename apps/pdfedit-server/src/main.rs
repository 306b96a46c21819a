//! PDF Edit Server
//!
//! Bakes annotation overlays into uploaded documents and offers the page
//! operations the editor front end relies on:
//!
//! - Overlay materialization (`/edit-pdf`)
//! - Merge and range split
//! - Page counting

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{
    handle_edit_pdf, handle_health, handle_merge_pdf, handle_page_count, handle_split_pdf,
};

/// Command-line arguments for the PDF edit server
#[derive(Parser, Debug)]
#[command(name = "pdfedit-server")]
#[command(about = "PDF overlay editing, merge and split server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Per-request processing timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Maximum request body size in megabytes
    #[arg(long, default_value = "50")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Upper bound on one document operation in milliseconds
    pub timeout_ms: u64,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

/// Build the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/edit-pdf", post(handle_edit_pdf))
        .route("/merge-pdf", post(handle_merge_pdf))
        .route("/split-pdf", post(handle_split_pdf))
        .route("/page-count", post(handle_page_count))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PDF edit server on {}:{}", args.host, args.port);

    let state = AppState {
        timeout_ms: args.timeout_ms,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
    };

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Processing timeout: {}ms", args.timeout_ms);
    info!("Upload limit: {}MB", args.max_upload_mb);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
