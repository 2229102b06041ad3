use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::content_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::content::ContentItem;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ContentItemResponse {
    pub section: String,
    pub item: String,
    pub data: Value,
    pub last_modified: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContentListResponse {
    pub section: String,
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    /// Dotted path such as `hero.title`
    pub path: String,
    pub value: Value,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_content_items(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Result<Json<JSend<ContentListResponse>>, ApiError> {
    let items = state
        .content
        .list_content_items(&section)
        .await
        .map_err(content_error)?;
    Ok(JSend::success(ContentListResponse { section, items }))
}

pub async fn get_content_item(
    State(state): State<Arc<AppState>>,
    Path((section, item)): Path<(String, String)>,
) -> Result<Json<JSend<ContentItemResponse>>, ApiError> {
    let content = state
        .content
        .get_content_item(&section, &item)
        .await
        .map_err(content_error)?;
    Ok(JSend::success(to_response(section, item, content)))
}

pub async fn update_content_item(
    State(state): State<Arc<AppState>>,
    Path((section, item)): Path<(String, String)>,
    AppJson(data): AppJson<Value>,
) -> Result<Json<JSend<ContentItemResponse>>, ApiError> {
    let content = state
        .content
        .update_content_item(&section, &item, data)
        .await
        .map_err(content_error)?;
    Ok(JSend::success(to_response(section, item, content)))
}

pub async fn update_content_field(
    State(state): State<Arc<AppState>>,
    Path((section, item)): Path<(String, String)>,
    AppJson(req): AppJson<UpdateFieldRequest>,
) -> Result<Json<JSend<ContentItemResponse>>, ApiError> {
    if req.path.trim().is_empty() {
        return Err(ApiError::bad_request("path must not be empty"));
    }

    let content = state
        .content
        .update_content_field(&section, &item, &req.path, req.value)
        .await
        .map_err(content_error)?;
    Ok(JSend::success(to_response(section, item, content)))
}

pub async fn delete_content_item(
    State(state): State<Arc<AppState>>,
    Path((section, item)): Path<(String, String)>,
) -> Result<Json<JSend<()>>, ApiError> {
    let deleted = state
        .content
        .delete_content_item(&section, &item)
        .await
        .map_err(content_error)?;
    if !deleted {
        return Err(ApiError::not_found("Content item not found"));
    }

    tracing::debug!(section = %section, item = %item, "Deleted content item");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn to_response(section: String, item: String, content: ContentItem) -> ContentItemResponse {
    ContentItemResponse {
        section,
        item,
        data: content.data,
        last_modified: content.last_modified.map(|t| t.to_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_item_returns_stub() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let Json(body) = get_content_item(
            State(state),
            Path(("pages".to_string(), "contact-us".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(body.data.data["meta"]["title"], "Contact Us");
        assert!(body.data.last_modified.is_none());
    }

    #[tokio::test]
    async fn test_field_update_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let key = ("pages".to_string(), "home".to_string());

        update_content_field(
            State(Arc::clone(&state)),
            Path(key.clone()),
            AppJson(UpdateFieldRequest {
                path: "hero.title".to_string(),
                value: json!("Hi"),
            }),
        )
        .await
        .unwrap();

        let Json(body) = get_content_item(State(Arc::clone(&state)), Path(key))
            .await
            .unwrap();
        assert_eq!(body.data.data["hero"]["title"], "Hi");
        assert!(body.data.last_modified.is_some());

        let Json(list) = list_content_items(State(state), Path("pages".to_string()))
            .await
            .unwrap();
        assert_eq!(list.data.items, vec!["home".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_item_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let result = delete_content_item(
            State(state),
            Path(("pages".to_string(), "ghost".to_string())),
        )
        .await;
        assert_eq!(
            result.err().map(|e| e.status_code()),
            Some(axum::http::StatusCode::NOT_FOUND)
        );
    }

    #[tokio::test]
    async fn test_traversal_in_section_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let result = get_content_item(
            State(state),
            Path(("..".to_string(), "secrets".to_string())),
        )
        .await;
        assert_eq!(
            result.err().map(|e| e.status_code()),
            Some(axum::http::StatusCode::BAD_REQUEST)
        );
    }
}
