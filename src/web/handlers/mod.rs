//! API handlers for the tree.

pub mod file;
pub mod folder;
pub mod tree;

pub use file::*;
pub use folder::*;
pub use tree::*;

use std::sync::Arc;

use crate::tree::{TreeService, DEFAULT_RECENT_LIMIT};
use crate::web::error::ApiError;

/// Shared state for all handlers.
pub struct AppState {
    /// The tree service.
    pub service: Arc<TreeService>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
    /// Default number of entries in the recent files view.
    pub recent_limit: usize,
}

impl AppState {
    /// Create handler state over `service`, taking the upload limit from it.
    pub fn new(service: Arc<TreeService>) -> Self {
        let max_upload_size = service.max_file_size();
        Self {
            service,
            max_upload_size,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    /// Set the default recent files limit.
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }
}

/// Run a tree service call off the async runtime.
///
/// Service calls can wait on the tree lock or on blob I/O, so handlers never make them
/// on a runtime worker.
pub(crate) async fn run_blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Blocking task failed");
            ApiError::internal("An internal error occurred")
        })?
        .map_err(ApiError::from)
}
