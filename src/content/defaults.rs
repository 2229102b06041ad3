//! Record shapes served when a config record is absent or incomplete.

use serde_json::{json, Map, Value};

use super::ConfigKind;

pub fn for_kind(kind: ConfigKind) -> Value {
    match kind {
        ConfigKind::Site => site(),
        ConfigKind::Seo => seo(),
        ConfigKind::Theme => theme(),
        ConfigKind::Settings => settings(),
    }
}

fn site() -> Value {
    json!({
        "site": {
            "name": "My Website",
            "tagline": "",
            "url": "http://localhost:3000",
            "language": "en",
            "logo": "",
            "favicon": ""
        },
        "contact": {
            "email": "",
            "phone": "",
            "address": ""
        },
        "social": {
            "facebook": "",
            "twitter": "",
            "instagram": "",
            "linkedin": "",
            "youtube": ""
        },
        "meta": {
            "updated": null
        }
    })
}

fn seo() -> Value {
    json!({
        "global": {
            "title_template": "%s | My Website",
            "default_title": "My Website",
            "default_description": "",
            "default_keywords": [],
            "og_image": ""
        },
        "robots": {
            "index": true,
            "follow": true
        },
        "analytics": {
            "google_analytics_id": "",
            "google_tag_manager_id": ""
        },
        "meta": {
            "updated": null
        }
    })
}

fn theme() -> Value {
    json!({
        "colors": {
            "primary": "#2563eb",
            "secondary": "#64748b",
            "accent": "#f59e0b",
            "background": "#ffffff",
            "text": "#0f172a"
        },
        "typography": {
            "heading_font": "Inter",
            "body_font": "Inter",
            "base_size": 16
        },
        "layout": {
            "max_width": 1200,
            "header_style": "default",
            "footer_style": "default"
        },
        "meta": {
            "updated": null
        }
    })
}

fn settings() -> Value {
    json!({
        "general": {
            "maintenance_mode": false,
            "timezone": "UTC",
            "date_format": "YYYY-MM-DD"
        },
        "media": {
            "max_upload_size": 10 * 1024 * 1024,
            "optimize_images": true,
            "max_width": 1920,
            "max_height": 1080,
            "quality": 80
        },
        "security": {
            "session_timeout_minutes": 60,
            "max_login_attempts": 5
        },
        "notifications": {
            "email_enabled": false,
            "email_address": ""
        },
        "backup": {
            "auto_backup": false,
            "retention_days": 30
        },
        "meta": {
            "updated": null
        }
    })
}

/// Stub returned for a content item that has never been written.
pub fn content_item(item: &str) -> Value {
    json!({
        "meta": {
            "title": title_case(item),
            "description": "",
            "keywords": []
        }
    })
}

/// Fill gaps in `existing` from `defaults`, at most one level deep.
///
/// Missing top-level sections are copied whole. Where both sides hold an object
/// for a section, keys missing from the existing section are added. Existing
/// values always win, and nothing below the section level is merged.
pub fn merge_one_level(existing: &Value, defaults: &Value) -> Value {
    let (Value::Object(existing_map), Value::Object(default_map)) = (existing, defaults) else {
        return existing.clone();
    };

    let mut merged: Map<String, Value> = existing_map.clone();
    for (section, default_section) in default_map {
        match merged.get_mut(section) {
            None => {
                merged.insert(section.clone(), default_section.clone());
            }
            Some(Value::Object(current)) => {
                if let Value::Object(default_fields) = default_section {
                    for (key, value) in default_fields {
                        current.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
            Some(_) => {}
        }
    }
    Value::Object(merged)
}

fn title_case(slug: &str) -> String {
    slug.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
