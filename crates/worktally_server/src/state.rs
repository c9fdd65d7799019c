//! Shared application state handed to every handler.

use crate::config::Config;
use crate::error::ApiError;
use crate::media::UploadStore;
use crate::StartError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use worktally_core::db::open_db;

pub struct AppState {
    pub config: Config,
    /// Single SQLite connection; handlers take it through [`run_db`].
    pub db: Mutex<Connection>,
    pub uploads: UploadStore,
}

impl AppState {
    /// Opens the database, prepares the uploads directory and wraps both
    /// for shared use.
    pub fn new(config: Config) -> Result<Arc<Self>, StartError> {
        let conn = open_db(&config.db_path)?;
        let uploads = UploadStore::new(config.uploads_dir.clone(), config.base_url.clone())
            .map_err(|source| StartError::Uploads {
                path: config.uploads_dir.clone(),
                source,
            })?;

        Ok(Arc::new(Self {
            config,
            db: Mutex::new(conn),
            uploads,
        }))
    }
}

/// Runs one database operation on the blocking pool.
///
/// The mutex is held only inside the blocking task, so request handlers
/// never block the async runtime on SQLite work.
pub async fn run_db<T, F>(state: &Arc<AppState>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    let handle = tokio::task::spawn_blocking(move || {
        let mut conn = state
            .db
            .lock()
            .map_err(|_| ApiError::internal("database mutex poisoned"))?;
        op(&mut conn)
    });

    handle.await.map_err(ApiError::internal)?
}
