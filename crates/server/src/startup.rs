use std::{env, net::SocketAddr, path::Path, sync::Arc};

use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};
use service::{collections::CollectionStore, file::collections::FileCollectionStore, runtime};

/// Everything `run` needs, resolved from config.toml or the environment.
struct Settings {
    addr: SocketAddr,
    cors_origin: String,
    store_path: String,
}

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

/// Cross-origin requests are allowed from exactly one configured origin.
pub fn build_cors(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid CORS origin: {origin}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE]))
}

/// Load settings from configs or env vars, with sensible fallbacks.
/// A storage path that fails validation is a startup failure, never a
/// per-request one.
fn load_settings() -> anyhow::Result<Settings> {
    let (host, port, cors_origin, store_path) = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => (
            cfg.server.host,
            cfg.server.port,
            cfg.server.cors_origin,
            cfg.storage.path,
        ),
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(3000);
            let cors_origin =
                env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
            let mut storage = configs::StorageConfig::default();
            storage.normalize_from_env();
            storage.validate()?;
            (host, port, cors_origin, storage.path)
        }
    };
    Ok(Settings {
        addr: format!("{}:{}", host, port).parse()?,
        cors_origin,
        store_path,
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let settings = load_settings()?;

    let data_dir = Path::new(&settings.store_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    runtime::ensure_env(&data_dir).await?;

    // The single process-lifetime store handle, shared by every request task.
    let coins: Arc<dyn CollectionStore> = FileCollectionStore::new(&settings.store_path).await?;
    let state = ServerState { coins };

    let cors = build_cors(&settings.cors_origin)?;
    let app: Router = routes::build_router(state, cors);

    info!(addr = %settings.addr, store = %settings.store_path, "starting coin service");
    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
