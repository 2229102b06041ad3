use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::{content_error, media_error};
use crate::api::response::{ApiError, JSend};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub entries_cleared: usize,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub records_deleted: u64,
    pub trash_entries_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Drop every cached record, e.g. after restoring a backup onto the data directory.
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<JSend<ClearCacheResponse>> {
    let entries_cleared = state.content.store().cache().len();
    state.content.reload();

    tracing::info!(entries = entries_cleared, "Cleared record cache");
    JSend::success(ClearCacheResponse { entries_cleared })
}

/// Test-only: delete every record and empty the trash.
pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let records_deleted = state
        .content
        .store()
        .purge()
        .await
        .map_err(|e| content_error(e.into()))?;
    let trash_entries_deleted = state.media.empty_trash().await.map_err(media_error)?;

    tracing::warn!(
        records = records_deleted,
        trash_entries = trash_entries_deleted,
        "Purged all records and trash"
    );

    Ok(JSend::success(PurgeResponse {
        records_deleted,
        trash_entries_deleted,
    }))
}
