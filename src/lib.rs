pub mod autocomplete;
pub mod browser;
pub mod config;
pub mod genres;
pub mod middleware;
pub mod render;
pub mod search;
pub mod server;
pub mod tmdb;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("TMDB client error: {0}")]
    Client(#[from] tmdb::ApiError),
    #[error("Server error: {0}")]
    Server(String),
}

pub async fn run(config_path: &str, debug_logs: bool) -> Result<(), ServerError> {
    let mut config = config::Config::from_file(config_path)?;
    config.debug_logs = debug_logs;

    info!("Using config file: {}", config_path);
    if debug_logs {
        info!("Debug logging enabled");
    }

    let api_key = config.api_key()?;
    let client = tmdb::TmdbClient::new(
        &config.tmdb.base_url,
        api_key,
        Duration::from_secs(config.tmdb.timeout),
    )?;
    info!("Using TMDB API at {}", config.tmdb.base_url);

    let images = render::ImageConfig {
        base_url: config.tmdb.image_base_url.clone(),
        placeholder: config.placeholder.clone(),
    };
    let controller = search::SearchController::new(
        Arc::new(client),
        Arc::new(genres::GenreCache::new()),
        images,
    );
    let browser = Arc::new(browser::Browser::new(controller));

    info!("Loading popular movies");
    browser.search_for("").await;

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };

    let state = server::AppState::new(config, browser);
    let app = server::build_router(state);

    if let Some((cert_path, key_path)) = tls {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}
