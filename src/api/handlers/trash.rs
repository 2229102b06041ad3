use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::media_error;
use crate::api::response::{ApiError, JSend};
use crate::media::{MediaEntry, TrashEntry};
use crate::notify::{Notification, Severity};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EmptyTrashResponse {
    pub entries_deleted: u64,
}

pub async fn list_trash(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<TrashEntry>>>, ApiError> {
    let entries = state.media.list_trash().await.map_err(media_error)?;
    Ok(JSend::success(entries))
}

pub async fn restore_from_trash(
    State(state): State<Arc<AppState>>,
    Path(trash_name): Path<String>,
) -> Result<Json<JSend<MediaEntry>>, ApiError> {
    let entry = state
        .media
        .restore_from_trash(&trash_name)
        .await
        .map_err(media_error)?;

    state
        .notifier
        .notify(Notification::new(
            "Restored from trash",
            format!("{} was restored", entry.path),
            Severity::Success,
        ))
        .await;

    Ok(JSend::success(entry))
}

pub async fn delete_from_trash(
    State(state): State<Arc<AppState>>,
    Path(trash_name): Path<String>,
) -> Result<Json<JSend<TrashEntry>>, ApiError> {
    let entry = state
        .media
        .delete_from_trash(&trash_name)
        .await
        .map_err(media_error)?;

    state
        .notifier
        .notify(Notification::new(
            "Permanently deleted",
            format!("{} was permanently deleted", entry.original_path),
            Severity::Warning,
        ))
        .await;

    Ok(JSend::success(entry))
}

pub async fn empty_trash(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<EmptyTrashResponse>>, ApiError> {
    let entries_deleted = state.media.empty_trash().await.map_err(media_error)?;

    state
        .notifier
        .notify(Notification::new(
            "Trash emptied",
            format!("{entries_deleted} item(s) permanently deleted"),
            Severity::Warning,
        ))
        .await;

    Ok(JSend::success(EmptyTrashResponse { entries_deleted }))
}
