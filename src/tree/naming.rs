//! Naming rules: display names, collision handling and physical keys.
//!
//! Display names are what users see and may collide across folders. Physical keys
//! are what the blob store sees; they are built from the node ID and never from a
//! caller-supplied string, so two files called `a.txt` never share storage.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{HoardError, Result};

use super::node::{FolderNode, NodeKind};

/// What to do when an upload's display name is already taken in the target folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileNamePolicy {
    /// Keep both files; the new one gets a timestamp suffix.
    #[default]
    Rename,
    /// Fail the upload with `Conflict`.
    Reject,
}

/// Broad file category derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Code,
    Archive,
    File,
}

impl FileCategory {
    /// Categorize a file by the (case-insensitive) extension of its name.
    pub fn from_name(name: &str) -> Self {
        let ext = extension(name).map(str::to_lowercase).unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" | "bmp" | "ico" => Self::Image,
            "mp4" | "avi" | "mov" | "wmv" | "flv" | "webm" | "mkv" | "3gp" => Self::Video,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" | "wma" => Self::Audio,
            "pdf" | "doc" | "docx" | "txt" | "rtf" | "odt" | "xls" | "xlsx" | "csv" | "ppt"
            | "pptx" | "odp" => Self::Document,
            "js" | "ts" | "jsx" | "tsx" | "html" | "css" | "scss" | "sass" | "json" | "xml"
            | "yml" | "yaml" | "py" | "java" | "cpp" | "c" | "php" | "rb" | "go" | "rs"
            | "sql" | "sh" | "bat" => Self::Code,
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" => Self::Archive,
            _ => Self::File,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Code => "code",
            Self::Archive => "archive",
            Self::File => "file",
        }
    }
}

/// Reduce a name to its final path segment.
///
/// Both `/` and `\` count as separators. Control characters are dropped and the
/// result is trimmed. `.` and `..` reduce to an empty string.
pub fn sanitize_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    match cleaned {
        "." | ".." => String::new(),
        other => other.to_string(),
    }
}

/// Extension of the final segment of `name`, without the dot.
///
/// Dot-files such as `.hidden` and names ending in a dot have no extension.
pub fn extension(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?;
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// Decide the display name of an upload.
///
/// A non-blank `provided` name wins; if it has no extension the uploaded file's extension
/// is appended. Otherwise the uploaded filename is used. Either way only the final path
/// segment survives. Fails with `InvalidInput` if nothing usable remains.
pub fn derive_display_name(provided: Option<&str>, uploaded_filename: &str) -> Result<String> {
    let candidate = match provided.map(str::trim).filter(|s| !s.is_empty()) {
        Some(custom) => match (extension(custom), extension(uploaded_filename)) {
            // A trailing dot is an explicit empty extension.
            (None, Some(ext)) if !custom.ends_with('.') => format!("{custom}.{ext}"),
            _ => custom.to_string(),
        },
        None => uploaded_filename.to_string(),
    };

    let name = sanitize_name(&candidate);
    if name.is_empty() {
        return Err(HoardError::InvalidInput("invalid file name".to_string()));
    }
    Ok(name)
}

/// Make `candidate` unique among the files of `folder` (ignoring case).
///
/// Under [`FileNamePolicy::Rename`] a `-<unix millis>` suffix is inserted before the
/// extension, followed by a counter if that is still taken. Under
/// [`FileNamePolicy::Reject`] a clash fails with `Conflict`.
pub fn resolve_name_collision(
    folder: &FolderNode,
    candidate: &str,
    policy: FileNamePolicy,
) -> Result<String> {
    if !folder.has_child_named(NodeKind::File, candidate) {
        return Ok(candidate.to_string());
    }

    if policy == FileNamePolicy::Reject {
        return Err(HoardError::Conflict(format!(
            "a file named '{candidate}' already exists in '{}'",
            folder.name
        )));
    }

    let (stem, suffix) = match extension(candidate) {
        Some(ext) => (&candidate[..candidate.len() - ext.len() - 1], format!(".{ext}")),
        None => (candidate, String::new()),
    };
    let millis = Utc::now().timestamp_millis();

    let mut renamed = format!("{stem}-{millis}{suffix}");
    let mut n = 1;
    while folder.has_child_named(NodeKind::File, &renamed) {
        renamed = format!("{stem}-{millis}-{n}{suffix}");
        n += 1;
    }
    Ok(renamed)
}

/// Build the blob store key for a file: its ID plus the display name's extension.
///
/// Extensions that are not plain ASCII alphanumerics are dropped.
pub fn derive_physical_key(id: &str, display_name: &str) -> String {
    match extension(display_name) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!("{id}.{ext}"),
        _ => id.to_string(),
    }
}
