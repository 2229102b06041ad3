//! Normalized, root-relative media paths.

use std::fmt;
use std::path::{Path, PathBuf};

use super::MediaError;

/// A path relative to the media root, normalized to plain name segments.
///
/// Construction resolves `.` and `..` lexically and refuses anything that would
/// climb above the root, so joining onto the root directory always stays inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MediaPath {
    segments: Vec<String>,
}

impl MediaPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a caller-supplied path. Both `/` and `\` separate segments and a
    /// leading separator means the media root.
    pub fn parse(raw: &str) -> Result<Self, MediaError> {
        let mut segments: Vec<String> = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(MediaError::PathTraversal(raw.to_string()));
                    }
                }
                s if s.contains('\0') || is_drive_prefix(s) => {
                    return Err(MediaError::PathTraversal(raw.to_string()));
                }
                s => segments.push(s.to_string()),
            }
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<MediaPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a single validated name.
    pub fn join(&self, name: &str) -> Result<MediaPath, MediaError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// True if `self` equals `ancestor` or lies beneath it.
    pub fn starts_with(&self, ancestor: &MediaPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

fn is_drive_prefix(segment: &str) -> bool {
    segment.len() == 2 && segment.ends_with(':') && segment.as_bytes()[0].is_ascii_alphabetic()
}

/// Check that `name` is usable as a single directory entry name.
pub fn validate_name(name: &str) -> Result<(), MediaError> {
    if name == ".." || name == "." || name.contains(['/', '\\', '\0']) {
        return Err(MediaError::PathTraversal(name.to_string()));
    }
    if name.trim().is_empty() {
        return Err(MediaError::Validation("name must not be empty".to_string()));
    }
    if name.starts_with('.') {
        return Err(MediaError::Validation(format!(
            "name '{name}' must not start with a dot"
        )));
    }
    Ok(())
}

/// Reduce an uploaded file name to a safe single segment.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// The `n`th collision-free candidate for `name`: `name`, `stem-1.ext`, `stem-2.ext`, ...
pub fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{name}-{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(MediaPath::parse("").unwrap(), MediaPath::root());
        assert_eq!(MediaPath::parse("/").unwrap(), MediaPath::root());
        assert_eq!(
            MediaPath::parse("/images//./blog/").unwrap().to_string(),
            "images/blog"
        );
        assert_eq!(
            MediaPath::parse("images\\blog\\..\\logo.png")
                .unwrap()
                .to_string(),
            "images/logo.png"
        );
    }

    #[test]
    fn test_parse_rejects_escape() {
        assert!(matches!(
            MediaPath::parse("../etc/passwd"),
            Err(MediaError::PathTraversal(_))
        ));
        assert!(matches!(
            MediaPath::parse("images/../../secret"),
            Err(MediaError::PathTraversal(_))
        ));
        assert!(matches!(
            MediaPath::parse("C:/Windows"),
            Err(MediaError::PathTraversal(_))
        ));
    }

    #[test]
    fn test_parent_and_starts_with() {
        let path = MediaPath::parse("a/b/c").unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "a/b");
        assert_eq!(path.name(), Some("c"));
        assert!(path.starts_with(&MediaPath::parse("a/b").unwrap()));
        assert!(path.starts_with(&path));
        assert!(!path.starts_with(&MediaPath::parse("a/bc").unwrap()));
        assert!(MediaPath::root().parent().is_none());
    }

    #[test]
    fn test_to_fs_path_stays_under_root() {
        let path = MediaPath::parse("a/../b/c.png").unwrap();
        assert_eq!(
            path.to_fs_path(Path::new("/srv/media")),
            PathBuf::from("/srv/media/b/c.png")
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("photos").is_ok());
        assert!(matches!(validate_name(".."), Err(MediaError::PathTraversal(_))));
        assert!(matches!(validate_name("a/b"), Err(MediaError::PathTraversal(_))));
        assert!(matches!(validate_name("/abs"), Err(MediaError::PathTraversal(_))));
        assert!(matches!(validate_name(" "), Err(MediaError::Validation(_))));
        assert!(matches!(validate_name(".trash"), Err(MediaError::Validation(_))));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My Photo (1).JPG"), "My-Photo--1-.JPG");
        assert_eq!(sanitize_file_name("../../evil.sh"), "evil.sh");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\doc.pdf"), "doc.pdf");
        assert_eq!(sanitize_file_name(".htaccess"), "htaccess");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[test]
    fn test_numbered_name() {
        assert_eq!(numbered_name("logo.png", 0), "logo.png");
        assert_eq!(numbered_name("logo.png", 2), "logo-2.png");
        assert_eq!(numbered_name("archive.tar.gz", 1), "archive.tar-1.gz");
        assert_eq!(numbered_name("README", 3), "README-3");
    }
}
