//! Typed access to the known config and content records.

pub mod defaults;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::records::value::{parse_path, set_path};
use crate::records::{PathError, RecordStore, RecordStoreError};

const CONFIG_COLLECTION: &str = "config";
const CONTENT_COLLECTION: &str = "content";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Unknown config kind: {0}")]
    UnknownKind(String),
    #[error("Record data must be a JSON object")]
    NotAnObject,
    #[error("Invalid field path: {0}")]
    Path(#[from] PathError),
    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

/// The config records the admin dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Site,
    Seo,
    Theme,
    Settings,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 4] = [
        ConfigKind::Site,
        ConfigKind::Seo,
        ConfigKind::Theme,
        ConfigKind::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Site => "site",
            ConfigKind::Seo => "seo",
            ConfigKind::Theme => "theme",
            ConfigKind::Settings => "settings",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKind {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ContentError::UnknownKind(s.to_string()))
    }
}

/// A content record together with its file's modification time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub data: Value,
    /// `None` when the item has never been written and `data` is a stub
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<RecordStore>,
}

impl ContentService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    // ========================================================================
    // Config records
    // ========================================================================

    /// Read a config record, falling back to (or filling gaps from) its defaults.
    pub async fn get_config(&self, kind: ConfigKind) -> Result<Value, ContentError> {
        let stored = self
            .store
            .read_record(CONFIG_COLLECTION, kind.as_str())
            .await?;
        let defaults = defaults::for_kind(kind);

        if is_empty_record(&stored) {
            return Ok(defaults);
        }
        Ok(defaults::merge_one_level(&stored, &defaults))
    }

    /// Replace a config record, stamping `meta.updated`.
    pub async fn update_config(&self, kind: ConfigKind, data: Value) -> Result<Value, ContentError> {
        let stamped = stamp_updated(data)?;
        self.store
            .write_record(CONFIG_COLLECTION, kind.as_str(), stamped.clone())
            .await?;
        tracing::debug!(config = %kind, "Updated config");
        Ok(stamped)
    }

    pub async fn get_site_config(&self) -> Result<Value, ContentError> {
        self.get_config(ConfigKind::Site).await
    }

    pub async fn update_site_config(&self, data: Value) -> Result<Value, ContentError> {
        self.update_config(ConfigKind::Site, data).await
    }

    pub async fn get_seo_config(&self) -> Result<Value, ContentError> {
        self.get_config(ConfigKind::Seo).await
    }

    pub async fn update_seo_config(&self, data: Value) -> Result<Value, ContentError> {
        self.update_config(ConfigKind::Seo, data).await
    }

    pub async fn get_theme_config(&self) -> Result<Value, ContentError> {
        self.get_config(ConfigKind::Theme).await
    }

    pub async fn update_theme_config(&self, data: Value) -> Result<Value, ContentError> {
        self.update_config(ConfigKind::Theme, data).await
    }

    pub async fn get_settings(&self) -> Result<Value, ContentError> {
        self.get_config(ConfigKind::Settings).await
    }

    pub async fn update_settings(&self, data: Value) -> Result<Value, ContentError> {
        self.update_config(ConfigKind::Settings, data).await
    }

    // ========================================================================
    // Content records
    // ========================================================================

    /// Read a content item, or a minimal stub if it has never been written.
    pub async fn get_content_item(
        &self,
        section: &str,
        item: &str,
    ) -> Result<ContentItem, ContentError> {
        let collection = content_collection(section);
        let stored = self.store.read_record(&collection, item).await?;

        if is_empty_record(&stored) {
            return Ok(ContentItem {
                data: defaults::content_item(item),
                last_modified: None,
            });
        }

        let last_modified = self.store.record_modified(&collection, item).await?;
        Ok(ContentItem {
            data: stored.as_ref().clone(),
            last_modified,
        })
    }

    pub async fn update_content_item(
        &self,
        section: &str,
        item: &str,
        data: Value,
    ) -> Result<ContentItem, ContentError> {
        let collection = content_collection(section);
        let stamped = stamp_updated(data)?;
        self.store
            .write_record(&collection, item, stamped.clone())
            .await?;
        tracing::debug!(section, item, "Updated content item");

        let last_modified = self.store.record_modified(&collection, item).await?;
        Ok(ContentItem {
            data: stamped,
            last_modified,
        })
    }

    /// Set one nested field (dotted path, e.g. `hero.title`) of a content item.
    pub async fn update_content_field(
        &self,
        section: &str,
        item: &str,
        field: &str,
        value: Value,
    ) -> Result<ContentItem, ContentError> {
        let path = parse_path(field)?;
        if path.is_empty() {
            return Err(PathError::EmptySegment.into());
        }

        let current = self.get_content_item(section, item).await?;
        let updated = set_path(&current.data, &path, value)?;
        self.update_content_item(section, item, updated).await
    }

    pub async fn list_content_items(&self, section: &str) -> Result<Vec<String>, ContentError> {
        Ok(self
            .store
            .list_record_names(&content_collection(section))
            .await?)
    }

    pub async fn delete_content_item(&self, section: &str, item: &str) -> Result<bool, ContentError> {
        Ok(self
            .store
            .delete_record(&content_collection(section), item)
            .await?)
    }

    pub async fn get_page_content(&self, page: &str) -> Result<ContentItem, ContentError> {
        self.get_content_item("pages", page).await
    }

    pub async fn get_component_content(&self, component: &str) -> Result<ContentItem, ContentError> {
        self.get_content_item("components", component).await
    }

    /// Drop cached records so out-of-band file changes become visible.
    pub fn reload(&self) {
        self.store.clear_cache();
    }
}

fn content_collection(section: &str) -> String {
    format!("{CONTENT_COLLECTION}/{section}")
}

fn is_empty_record(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

fn stamp_updated(data: Value) -> Result<Value, ContentError> {
    if !data.is_object() {
        return Err(ContentError::NotAnObject);
    }
    let now = Value::String(Utc::now().to_rfc3339());
    Ok(set_path(&data, &["meta", "updated"], now)?)
}
