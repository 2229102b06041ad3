use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::media_error;
use crate::api::response::ApiError;
use crate::AppState;

/// Stream a media file by its library path.
/// Route: GET /files/*path
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    axum::extract::Path(path): axum::extract::Path<String>,
) -> Result<Response, ApiError> {
    let fs_path = state.media.file_path(&path).await.map_err(media_error)?;

    let file = tokio::fs::File::open(&fs_path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to open file: {e}")))?;
    let byte_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to stat file: {e}")))?
        .len();

    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(file))).into_response();
    let headers = response.headers_mut();

    let mime_type = mime_guess::from_path(&fs_path).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .essence_str()
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(byte_size));

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );

    let filename = disposition_filename(path.rsplit('/').next().unwrap_or(&path));
    if let Ok(value) = format!("inline; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Entries can be renamed or replaced, so revalidate every time
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));

    Ok(response)
}

/// Reduce a file name to something safe inside a quoted header parameter.
fn disposition_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect()
}
