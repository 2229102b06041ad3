use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;

use super::content_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::content::ConfigKind;
use crate::AppState;

pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<JSend<Value>>, ApiError> {
    let kind: ConfigKind = kind.parse().map_err(content_error)?;
    let config = state.content.get_config(kind).await.map_err(content_error)?;
    Ok(JSend::success(config))
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    AppJson(data): AppJson<Value>,
) -> Result<Json<JSend<Value>>, ApiError> {
    let kind: ConfigKind = kind.parse().map_err(content_error)?;
    let saved = state
        .content
        .update_config(kind, data)
        .await
        .map_err(content_error)?;
    Ok(JSend::success(saved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_config_serves_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let Json(body) = get_config(State(state), Path("theme".to_string()))
            .await
            .unwrap();
        assert_eq!(body.data["colors"]["primary"], "#2563eb");
    }

    #[tokio::test]
    async fn test_update_then_get_config() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        update_config(
            State(Arc::clone(&state)),
            Path("site".to_string()),
            AppJson(json!({"site": {"name": "Acme"}})),
        )
        .await
        .unwrap();

        let Json(body) = get_config(State(state), Path("site".to_string()))
            .await
            .unwrap();
        assert_eq!(body.data["site"]["name"], "Acme");
        assert!(body.data["meta"]["updated"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_config_kind_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let result = get_config(State(state), Path("passwords".to_string())).await;
        assert_eq!(
            result.err().map(|e| e.status_code()),
            Some(axum::http::StatusCode::NOT_FOUND)
        );
    }
}
