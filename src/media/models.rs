use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a file derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Audio,
    Binary,
    Document,
    Image,
    Video,
}

impl FileType {
    /// Derive a file type classification from a MIME type string.
    pub fn from_mime(mime_type: &str) -> Self {
        let (primary, sub) = mime_type.split_once('/').unwrap_or((mime_type, ""));
        match primary {
            "audio" => FileType::Audio,
            "image" => FileType::Image,
            "video" => FileType::Video,
            "text" => FileType::Document,
            "application" => match sub {
                "pdf"
                | "msword"
                | "rtf"
                | "vnd.openxmlformats-officedocument.wordprocessingml.document"
                | "vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                | "vnd.ms-excel" => FileType::Document,
                _ => FileType::Binary,
            },
            _ => FileType::Binary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Audio => "audio",
            FileType::Binary => "binary",
            FileType::Document => "document",
            FileType::Image => "image",
            FileType::Video => "video",
        }
    }
}

/// Pixel size of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A file or directory under the media root. `path` is its identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaEntry {
    pub path: String,
    pub name: String,
    pub is_directory: bool,
    /// File length, or the recursive sum of contained files for directories
    pub size: u64,
    pub mime_type: Option<String>,
    pub file_type: Option<FileType>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub dimensions: Option<Dimensions>,
}

/// A soft-deleted media entry, stored in the trash index (msgpack)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashEntry {
    /// Name of the payload inside the trash, unrelated to the original name
    pub trash_name: String,
    pub original_path: String,
    pub name: String,
    pub deleted_at: DateTime<Utc>,
    pub size: u64,
    pub is_directory: bool,
}

/// Image processing requested alongside an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UploadOptions {
    #[serde(default)]
    pub optimize: bool,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    /// JPEG quality, 1-100
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_max_width() -> u32 {
    1920
}

fn default_max_height() -> u32 {
    1080
}

fn default_quality() -> u8 {
    80
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            optimize: false,
            max_width: default_max_width(),
            max_height: default_max_height(),
            quality: default_quality(),
        }
    }
}

impl UploadOptions {
    pub fn optimized() -> Self {
        Self {
            optimize: true,
            ..Default::default()
        }
    }
}
