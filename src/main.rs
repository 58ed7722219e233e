use std::env;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

mod api;
mod app_env;
mod domain;
mod dto;
mod external_connections;
mod logging;
mod persistence;
mod routes;
mod routing_utils;

/// State shared by every request handler
pub struct SharedData {
    pub ext_cxn: external_connections::PoolExternalConnectivity,
    pub cookies: api::tasks::CookieSettings,
}

pub type AppState = State<Arc<SharedData>>;

/// Process configuration read once at startup. Failures here are the only
/// conditions allowed to take the process down.
struct AppConfig {
    database_url: String,
    host: String,
    port: u16,
    frontend_origin: String,
    secure_cookies: bool,
}

impl AppConfig {
    fn from_env() -> Result<AppConfig, anyhow::Error> {
        let database_url = env::var(app_env::DB_URL)
            .with_context(|| format!("{} must be set", app_env::DB_URL))?;
        let host = env::var(app_env::HOST).unwrap_or_else(|_| "0.0.0.0".to_owned());
        let port = match env::var(app_env::PORT) {
            Ok(raw_port) => raw_port
                .parse()
                .with_context(|| format!("{} must be a port number", app_env::PORT))?,
            Err(_) => 8080,
        };
        let frontend_origin = env::var(app_env::FRONTEND_ORIGIN)
            .unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let secure_cookies = env::var(app_env::SECURE_COOKIES)
            .map(|value| matches!(value.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(AppConfig {
            database_url,
            host,
            port,
            frontend_origin,
            secure_cookies,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let config = AppConfig::from_env()?;

    info!("Connecting to the database.");
    let db_pool = persistence::connect_pool(&config.database_url)
        .await
        .context("opening the database pool")?;
    persistence::bootstrap_schema(&db_pool).await?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: external_connections::PoolExternalConnectivity::new(db_pool.clone()),
        cookies: api::tasks::CookieSettings {
            secure: config.secure_cookies,
        },
    });

    let router = routes::build_router(shared_data, &config.frontend_origin)?;
    let router = logging::attach_tracing_http(router);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    info!(
        "Listening on {}",
        listener.local_addr().context("reading the bound address")?
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    // In-flight requests have drained by now; release the storage handle last.
    db_pool.close().await;
    info!("Server shutdown complete.");

    Ok(())
}

/// Completes when SIGINT (Ctrl+C) or, on Unix, SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
