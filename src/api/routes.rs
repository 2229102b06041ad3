use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for multipart framing and the small text fields sent alongside the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.media.max_upload_size as usize + MULTIPART_OVERHEAD;

    let mut router = Router::new()
        // Config records
        .route(
            "/config/:kind",
            get(handlers::get_config).put(handlers::update_config),
        )
        // Content records
        .route("/content/:section", get(handlers::list_content_items))
        .route(
            "/content/:section/:item",
            get(handlers::get_content_item)
                .put(handlers::update_content_item)
                .patch(handlers::update_content_field)
                .delete(handlers::delete_content_item),
        )
        // Media library
        .route(
            "/media",
            get(handlers::list_media).delete(handlers::trash_entry),
        )
        .route("/media/directories", post(handlers::create_directory))
        .route(
            "/media/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/media/rename", post(handlers::rename_entry))
        .route("/media/move", post(handlers::move_entry))
        .route("/media/copy", post(handlers::copy_entry))
        // Trash
        .route(
            "/media/trash",
            get(handlers::list_trash).delete(handlers::empty_trash),
        )
        .route("/media/trash/:name", delete(handlers::delete_from_trash))
        .route(
            "/media/trash/:name/restore",
            post(handlers::restore_from_trash),
        )
        // Media content
        .route("/files/*path", get(handlers::serve_media))
        // Admin
        .route("/admin/cache/clear", post(handlers::clear_cache))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, purge route is available");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
