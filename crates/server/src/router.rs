//! HTTP router for the file storage endpoints

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use fsg_core::{ObjectKey, ObjectStore, StorageConfig};

use crate::error::ApiError;
use crate::handlers;

/// Prefix every storage route lives under
pub const ROUTE_PREFIX: &str = "/api/s3";

/// Shared state handed to every handler
///
/// Built once at startup; nothing in it changes afterwards.
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub bucket: String,
    pub is_active: bool,
}

impl AppState {
    pub fn new(config: &StorageConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            bucket: config.bucket.clone(),
            is_active: config.is_active,
        }
    }

    /// Refuse the request when storage is switched off
    pub fn ensure_active(&self) -> Result<(), ApiError> {
        if self.is_active {
            Ok(())
        } else {
            Err(ApiError::Inactive)
        }
    }

    /// Activation check followed by key construction
    pub fn object_key(&self, dir: String, file_name: String) -> Result<ObjectKey, ApiError> {
        self.ensure_active()?;
        ObjectKey::new(dir, file_name).map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);
    let object_route = format!("{ROUTE_PREFIX}/{{path}}/{{file_name}}");

    Router::new()
        .route("/health", get(handlers::health))
        .route(ROUTE_PREFIX, get(handlers::list_files))
        .route(
            &object_route,
            get(handlers::get_file)
                .post(handlers::save_file)
                .delete(handlers::delete_file),
        )
        // Uploads are streamed to the backend, so no body size cap here.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}
