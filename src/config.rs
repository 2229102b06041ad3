use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// MIME types accepted by the media library unless `ALLOWED_MIME_TYPES` overrides them.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
    "video/mp4",
    "video/webm",
    "audio/mpeg",
    "audio/wav",
    "text/plain",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    /// Enables test-only routes. Must never be true in production.
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root for `config/` and `content/` record files
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub media_root: PathBuf,
    /// Holds trashed payloads and the trash index
    pub trash_root: PathBuf,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        let media_root = PathBuf::from("./public/uploads");
        Self {
            trash_root: media_root.join(".trash"),
            media_root,
            max_upload_size: 10 * 1024 * 1024, // 10MB
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MediaConfig {
    /// Media settings rooted at `media_root`, with the trash inside it.
    pub fn rooted_at(media_root: impl Into<PathBuf>) -> Self {
        let media_root = media_root.into();
        Self {
            trash_root: media_root.join(".trash"),
            media_root,
            ..Default::default()
        }
    }

    pub fn is_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let media_root =
            std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./public/uploads".to_string());
        let media_root = PathBuf::from(media_root);

        let trash_root = std::env::var("TRASH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| media_root.join(".trash"));

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024);

        let allowed_mime_types: Vec<String> = std::env::var("ALLOWED_MIME_TYPES")
            .map(|types| {
                types
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                DEFAULT_ALLOWED_MIME_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            server: ServerConfig { bind_address },
            storage: StorageConfig {
                data_dir: PathBuf::from(data_dir),
            },
            media: MediaConfig {
                media_root,
                trash_root,
                max_upload_size,
                allowed_mime_types,
            },
            test_mode,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.media.media_root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "MEDIA_ROOT cannot be empty".to_string(),
            ));
        }

        if self.media.trash_root == self.media.media_root {
            return Err(ConfigError::ValidationError(
                "TRASH_DIR must differ from MEDIA_ROOT".to_string(),
            ));
        }

        if self.media.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.media.allowed_mime_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "ALLOWED_MIME_TYPES must name at least one type".to_string(),
            ));
        }

        if self.media.max_upload_size > 100 * 1024 * 1024 {
            tracing::warn!(
                max_upload_size = self.media.max_upload_size,
                "Upload ceiling above 100MB; uploads are buffered in memory"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_media_config_nests_trash() {
        let media = MediaConfig::default();
        assert_eq!(media.trash_root, media.media_root.join(".trash"));
        assert_eq!(media.max_upload_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_is_allowed_ignores_case() {
        let media = MediaConfig::default();
        assert!(media.is_allowed("image/png"));
        assert!(media.is_allowed("IMAGE/PNG"));
        assert!(!media.is_allowed("application/x-msdownload"));
    }

    #[test]
    fn test_validate_rejects_trash_equal_to_media_root() {
        let mut config = Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            media: MediaConfig::default(),
            test_mode: false,
        };
        config.media.trash_root = config.media.media_root.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_allow_list() {
        let mut config = Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            media: MediaConfig::default(),
            test_mode: false,
        };
        config.media.allowed_mime_types.clear();
        assert!(config.validate().is_err());
    }
}
