use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.storage.max_upload_size as usize;

    let mut router = Router::new()
        // Sessions
        .route("/signin", post(handlers::signin))
        .route("/signin/new_token", post(handlers::refresh_token))
        .route("/signup", post(handlers::signup))
        .route("/logout/:session_id", get(handlers::logout))
        // Files
        .route(
            "/file/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/file/list", get(handlers::list_files))
        .route(
            "/file/update/:file_id",
            put(handlers::replace_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/file/delete/:file_id", delete(handlers::delete_file))
        .route("/file/download/:owner_id/:file_id", get(handlers::download_file))
        .route("/file/:owner_id/:file_id", get(handlers::get_file))
        // Push channel
        .route("/ws", get(handlers::push_channel))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled — purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
