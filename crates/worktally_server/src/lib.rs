//! HTTP server for Worktally.
//! Wires the core services to an axum router and owns process startup.

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{get, patch, post};
use axum::Router;
use log::{error, info};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use worktally_core::db::DbError;
use worktally_core::init_logging;

pub mod config;
pub mod dto;
pub mod error;
pub mod media;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use state::AppState;

/// Largest accepted request body. Covers the two images plus form fields.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Failure during process startup or while the listener is running.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("database open failed: {0}")]
    Db(#[from] DbError),
    #[error("uploads directory {path} unavailable: {source}")]
    Uploads { path: PathBuf, source: io::Error },
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },
    #[error("server terminated: {0}")]
    Serve(io::Error),
}

/// Loads configuration, opens the database and serves until shutdown.
pub async fn run() -> Result<(), StartError> {
    let config = Config::load()?;
    init_logging(&config.log_level, &config.log_dir.to_string_lossy())
        .map_err(StartError::Logging)?;
    let state = AppState::new(config)?;
    serve(state).await
}

/// Builds the application router with all public routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/signup", post(routes::signup))
        .route("/login", post(routes::login))
        .route("/project", post(routes::create_project))
        .route("/project/:id", patch(routes::update_project))
        .route("/project/:id/resume", post(routes::resume_project))
        .route("/projects/:user_id", get(routes::list_projects))
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(cors)
        .with_state(state)
}

async fn serve(state: Arc<AppState>) -> Result<(), StartError> {
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = build_router(Arc::clone(&state));

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartError::Bind {
            address: address.clone(),
            source,
        })?;

    info!(
        "event=server_start module=server status=ok address={address} base_url={} db_path={}",
        state.config.base_url,
        state.config.db_path.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartError::Serve)?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

/// Resolves when the process receives an interrupt or terminate signal.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(
                "event=shutdown module=server status=error error_code=signal_handler error={err}"
            );
            std::future::pending::<()>().await;
        }
        info!("event=shutdown module=server status=start signal=interrupt");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown module=server status=start signal=terminate");
            }
            Err(err) => {
                error!(
                    "event=shutdown module=server status=error error_code=signal_handler error={err}"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
