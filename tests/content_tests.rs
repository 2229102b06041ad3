use std::sync::Arc;

use chrono::{DateTime, Utc};
use content_manager::content::{ConfigKind, ContentError, ContentService};
use content_manager::records::{RecordCache, RecordStore};
use serde_json::json;

fn test_service() -> (tempfile::TempDir, ContentService) {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::new(dir.path().join("data"), RecordCache::new());
    (dir, ContentService::new(Arc::new(store)))
}

// ============================================================================
// Config records
// ============================================================================

#[tokio::test]
async fn test_missing_configs_return_defaults() {
    let (_dir, content) = test_service();

    let site = content.get_site_config().await.unwrap();
    assert_eq!(site["site"]["name"], "My Website");
    assert!(site["meta"]["updated"].is_null());

    let seo = content.get_seo_config().await.unwrap();
    assert_eq!(seo["robots"]["index"], true);

    let theme = content.get_theme_config().await.unwrap();
    assert!(theme["colors"]["primary"].is_string());

    let settings = content.get_settings().await.unwrap();
    assert_eq!(settings["media"]["max_width"], 1920);

    // Defaults are served, not persisted
    assert!(content.store().list_record_names("config").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_config_is_merged_one_level() {
    let (_dir, content) = test_service();
    content
        .store()
        .write_record(
            "config",
            "settings",
            json!({
                "general": {"timezone": "Europe/Berlin"},
                "custom": {"flag": true}
            }),
        )
        .await
        .unwrap();

    let settings = content.get_settings().await.unwrap();
    assert_eq!(settings["general"]["timezone"], "Europe/Berlin");
    assert_eq!(settings["general"]["maintenance_mode"], false);
    assert_eq!(settings["backup"]["retention_days"], 30);
    assert_eq!(settings["custom"]["flag"], true);

    // Stored record is untouched by the read-side merge
    let stored = content.store().read_record("config", "settings").await.unwrap();
    assert!(stored.get("backup").is_none());
}

#[tokio::test]
async fn test_update_config_stamps_meta_updated() {
    let (_dir, content) = test_service();
    let before = Utc::now();

    let written = content
        .update_site_config(json!({"site": {"name": "Acme"}, "meta": {"author": "ops"}}))
        .await
        .unwrap();

    let stamp = written["meta"]["updated"].as_str().unwrap();
    let stamp = DateTime::parse_from_rfc3339(stamp).unwrap().with_timezone(&Utc);
    assert!(stamp >= before);
    assert_eq!(written["meta"]["author"], "ops");

    content.reload();
    let site = content.get_site_config().await.unwrap();
    assert_eq!(site["site"]["name"], "Acme");
    assert_eq!(site["meta"]["updated"], written["meta"]["updated"]);
    assert_eq!(site["site"]["language"], "en");
}

#[tokio::test]
async fn test_update_config_rejects_non_object() {
    let (_dir, content) = test_service();

    let result = content.update_config(ConfigKind::Theme, json!(["not", "an", "object"])).await;
    assert!(matches!(result, Err(ContentError::NotAnObject)));
    assert!(!content
        .store()
        .record_path("config", "theme")
        .unwrap()
        .exists());
}

#[tokio::test]
async fn test_config_kind_parsing() {
    assert_eq!("seo".parse::<ConfigKind>().unwrap(), ConfigKind::Seo);
    assert!(matches!(
        "plugins".parse::<ConfigKind>(),
        Err(ContentError::UnknownKind(_))
    ));
}

// ============================================================================
// Content records
// ============================================================================

#[tokio::test]
async fn test_content_item_reports_file_mtime() {
    let (_dir, content) = test_service();
    content
        .store()
        .write_record("content/pages", "home", json!({"hero": {"title": "Hi"}}))
        .await
        .unwrap();

    let item = content.get_page_content("home").await.unwrap();
    assert_eq!(item.data["hero"]["title"], "Hi");

    let path = content.store().record_path("content/pages", "home").unwrap();
    let mtime: DateTime<Utc> = std::fs::metadata(path).unwrap().modified().unwrap().into();
    assert_eq!(item.last_modified, Some(mtime));
}

#[tokio::test]
async fn test_missing_content_item_returns_stub() {
    let (_dir, content) = test_service();

    let item = content.get_component_content("call-to-action").await.unwrap();
    assert_eq!(item.last_modified, None);
    assert_eq!(
        item.data,
        json!({"meta": {"title": "Call To Action", "description": "", "keywords": []}})
    );
    assert!(content.list_content_items("components").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_content_field_keeps_siblings() {
    let (_dir, content) = test_service();
    content
        .update_content_item(
            "pages",
            "about",
            json!({"hero": {"title": "About", "subtitle": "Us"}, "sections": [{"title": "A"}]}),
        )
        .await
        .unwrap();

    let updated = content
        .update_content_field("pages", "about", "hero.title", json!("About Acme"))
        .await
        .unwrap();
    assert_eq!(updated.data["hero"]["title"], "About Acme");
    assert_eq!(updated.data["hero"]["subtitle"], "Us");
    assert!(updated.last_modified.is_some());

    let appended = content
        .update_content_field("pages", "about", "sections.1.title", json!("B"))
        .await
        .unwrap();
    assert_eq!(appended.data["sections"], json!([{"title": "A"}, {"title": "B"}]));

    let result = content
        .update_content_field("pages", "about", "sections.5.title", json!("Z"))
        .await;
    assert!(matches!(result, Err(ContentError::Path(_))));

    content.reload();
    let reread = content.get_page_content("about").await.unwrap();
    assert_eq!(reread.data, appended.data);
}

#[tokio::test]
async fn test_update_content_field_on_missing_item_starts_from_stub() {
    let (_dir, content) = test_service();

    let item = content
        .update_content_field("pages", "contact-us", "hero.title", json!("Say hello"))
        .await
        .unwrap();
    assert_eq!(item.data["hero"]["title"], "Say hello");
    assert_eq!(item.data["meta"]["title"], "Contact Us");
    assert!(item.data["meta"]["updated"].is_string());
}

#[tokio::test]
async fn test_list_and_delete_content_items() {
    let (_dir, content) = test_service();
    for page in ["services", "home", "about"] {
        content
            .update_content_item("pages", page, json!({"page": page}))
            .await
            .unwrap();
    }

    assert_eq!(
        content.list_content_items("pages").await.unwrap(),
        vec!["about", "home", "services"]
    );

    assert!(content.delete_content_item("pages", "home").await.unwrap());
    assert!(!content.delete_content_item("pages", "home").await.unwrap());
    assert_eq!(
        content.list_content_items("pages").await.unwrap(),
        vec!["about", "services"]
    );
    assert_eq!(content.get_page_content("home").await.unwrap().last_modified, None);
}

#[tokio::test]
async fn test_reload_picks_up_hand_edits() {
    let (_dir, content) = test_service();
    content
        .update_content_item("components", "footer", json!({"text": "old"}))
        .await
        .unwrap();

    let path = content
        .store()
        .record_path("content/components", "footer")
        .unwrap();
    std::fs::write(&path, br#"{"text": "edited by hand"}"#).unwrap();

    let cached = content.get_component_content("footer").await.unwrap();
    assert_eq!(cached.data["text"], "old");

    content.reload();
    let fresh = content.get_component_content("footer").await.unwrap();
    assert_eq!(fresh.data["text"], "edited by hand");
}
