use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;

use super::media_error;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, JSendPaginated};
use crate::media::{MediaEntry, TrashEntry, UploadOptions};
use crate::notify::{Notification, Severity};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListMediaParams {
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub file_type: Option<String>,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
pub struct PathParams {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDirectoryRequest {
    #[serde(default)]
    pub parent: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub path: String,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub source: String,
    /// Destination directory; empty means the media root
    #[serde(default)]
    pub destination: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_media(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListMediaParams>,
) -> Result<Json<JSendPaginated<MediaEntry>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let entries = state.media.list(&params.path).await.map_err(media_error)?;
    let filtered: Vec<MediaEntry> = match params.file_type.as_deref() {
        Some("directory") => entries.into_iter().filter(|e| e.is_directory).collect(),
        Some(ft) => entries
            .into_iter()
            .filter(|e| e.file_type.is_some_and(|t| t.as_str() == ft))
            .collect(),
        None => entries,
    };

    Ok(JSendPaginated::paginate(filtered, params.limit, params.offset))
}

pub async fn create_directory(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateDirectoryRequest>,
) -> Result<Json<JSend<MediaEntry>>, ApiError> {
    let entry = state
        .media
        .create_directory(&req.parent, &req.name)
        .await
        .map_err(media_error)?;
    Ok(JSend::success(entry))
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<MediaEntry>>, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;
    let mut parent = String::new();
    let mut options = UploadOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                file_data = Some(data);
            }
            "path" => parent = text_field(field, "path").await?,
            "optimize" => {
                let value = text_field(field, "optimize").await?;
                options.optimize = matches!(value.trim(), "true" | "1" | "on");
            }
            "max_width" => options.max_width = number_field(field, "max_width").await?,
            "max_height" => options.max_height = number_field(field, "max_height").await?,
            "quality" => options.quality = number_field(field, "quality").await?,
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let file_data = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    let file_name = file_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("file must have a file name"))?;
    if options.quality == 0 || options.quality > 100 {
        return Err(ApiError::bad_request("quality must be between 1 and 100"));
    }

    let entry = state
        .media
        .upload(
            &parent,
            file_data,
            &file_name,
            file_content_type.as_deref().unwrap_or_default(),
            options,
        )
        .await
        .map_err(media_error)?;

    state
        .notifier
        .notify(Notification::new(
            "File uploaded",
            format!("{} was uploaded", entry.path),
            Severity::Success,
        ))
        .await;

    Ok(JSend::success(entry))
}

pub async fn rename_entry(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RenameRequest>,
) -> Result<Json<JSend<MediaEntry>>, ApiError> {
    let entry = state
        .media
        .rename(&req.path, &req.new_name)
        .await
        .map_err(media_error)?;
    Ok(JSend::success(entry))
}

pub async fn move_entry(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<TransferRequest>,
) -> Result<Json<JSend<MediaEntry>>, ApiError> {
    let entry = state
        .media
        .move_entry(&req.source, &req.destination)
        .await
        .map_err(media_error)?;
    Ok(JSend::success(entry))
}

pub async fn copy_entry(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<TransferRequest>,
) -> Result<Json<JSend<MediaEntry>>, ApiError> {
    let entry = state
        .media
        .copy_entry(&req.source, &req.destination)
        .await
        .map_err(media_error)?;
    Ok(JSend::success(entry))
}

pub async fn trash_entry(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<PathParams>,
) -> Result<Json<JSend<TrashEntry>>, ApiError> {
    let entry = state
        .media
        .move_to_trash(&params.path)
        .await
        .map_err(media_error)?;

    state
        .notifier
        .notify(Notification::new(
            "Moved to trash",
            format!("{} was moved to the trash", entry.original_path),
            Severity::Info,
        ))
        .await;

    Ok(JSend::success(entry))
}

// ============================================================================
// Helpers
// ============================================================================

async fn text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid {name}: {e}")))
}

async fn number_field<T: std::str::FromStr>(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<T, ApiError> {
    text_field(field, name)
        .await?
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{name} must be a non-negative integer")))
}
