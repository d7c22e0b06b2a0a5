//! API Routes
//!
//! Configures the Axum router with all file server endpoints.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_delete, create_directory, create_file, get_config, get_file_content, health,
    list_files, move_file, save_file, search_files, specific_dirs, stats,
};
use super::state::AppState;
use super::transfer::{download_file, upload_files};

/// Request framing allowed on top of the file payload itself.
const BODY_OVERHEAD: u64 = 1024 * 1024;

/// Largest request body accepted for a given file size limit. JSON string
/// escaping can double the payload, hence the factor of two.
pub fn body_limit(max_file_size: u64) -> usize {
    let limit = max_file_size.saturating_mul(2).saturating_add(BODY_OVERHEAD);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// Creates the main router with every endpoint nested under `/api`.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
/// - Body limit: sized from the configured `max_file_size`
pub fn create_router(state: AppState) -> Router {
    let max_body = body_limit(state.config.max_file_size);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let api = Router::new()
        .route("/files", get(list_files))
        .route("/files/content", get(get_file_content))
        .route("/files/download", get(download_file))
        .route("/files/upload", post(upload_files))
        .route("/files/save", post(save_file))
        .route("/files/create", post(create_file))
        .route("/files/mkdir", post(create_directory))
        .route("/files/move", post(move_file))
        .route("/files/batch-delete", post(batch_delete))
        .route("/search", post(search_files))
        .route("/config", get(get_config))
        .route("/specific-dirs", get(specific_dirs))
        .route("/health", get(health))
        .route("/stats", get(stats));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
