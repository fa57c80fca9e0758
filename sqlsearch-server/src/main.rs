use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use sqlsearch::config::{Config, CorsConfig, ObservabilityConfig};
use sqlsearch::storage::SqliteStore;
use sqlsearch::SearchEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sqlsearch-server")]
#[command(about = "Elasticsearch-compatible search over SQLite")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "sqlsearch.toml")]
    config: PathBuf,

    /// Host to bind to (overrides server.bind_addr)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.bind_addr)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file, or `:memory:`
    #[arg(long, env = "SQLSEARCH_DB")]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_create(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    if let Some(db) = args.db {
        config.storage.db_path = db;
    }

    init_tracing(&config.observability);
    tracing::info!("Config file: {}", args.config.display());

    let addr = bind_addr(&config.server.bind_addr, args.host.as_deref(), args.port);

    let store = Arc::new(
        SqliteStore::open(&config.storage.db_path)
            .with_context(|| format!("opening {}", config.storage.db_path.display()))?,
    );
    tracing::info!("Storage: {}", config.storage.db_path.display());
    let engine = Arc::new(SearchEngine::open(store).await?);

    let app = sqlsearch_es_compat::es_compat_router(engine)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(build_cors_layer(&config.server.cors))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| observability.log_format.clone());

    let registry = tracing_subscriber::registry().with(filter);
    if format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Apply `--host` / `--port` on top of the configured `host:port`.
fn bind_addr(configured: &str, host: Option<&str>, port: Option<u16>) -> String {
    let (cfg_host, cfg_port) = configured
        .rsplit_once(':')
        .unwrap_or((configured, "9200"));
    let host = host.unwrap_or(cfg_host);
    match port {
        Some(port) => format!("{}:{}", host, port),
        None => format!("{}:{}", host, cfg_port),
    }
}

fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    if !cors.enabled {
        return CorsLayer::new();
    }

    let has_wildcard = cors.origins.iter().any(|o| o == "*");
    let origins: Vec<HeaderValue> = cors
        .origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let layer = if has_wildcard {
        CorsLayer::new().allow_origin(tower_http::cors::Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    layer
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::HEAD, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
