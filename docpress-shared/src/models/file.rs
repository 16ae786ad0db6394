//! Uploaded files and their per-project settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file uploaded by the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    /// File id.
    pub id: i64,
    /// Name the file had on the uploader's machine.
    pub original_filename: String,
    /// Location in the backend's storage.
    #[serde(default)]
    pub storage_path: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type detected at upload.
    pub file_type: String,
    /// Owner of the upload.
    #[serde(default)]
    pub uploader_id: i64,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// Acknowledgement returned by `POST files/upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Id assigned to the new file.
    pub file_id: i64,
    /// Stored file name.
    pub filename: String,
    /// Size in bytes.
    pub file_size: u64,
}

/// A file attached to a project, with per-project presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectFile {
    /// Attachment id.
    pub id: i64,
    /// The uploaded file.
    pub file_id: i64,
    /// Heading used in the exported document.
    pub display_name: String,
    /// Name the file was uploaded with.
    pub original_filename: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type.
    pub file_type: String,
    /// Highlight language; detected from the name when absent.
    #[serde(default)]
    pub language_override: Option<String>,
    /// Whether the file appears in exports.
    pub include_in_export: bool,
    /// Position in the exported document.
    pub order_index: i32,
    /// When the file was attached.
    pub created_at: DateTime<Utc>,
}

/// Payload of `GET files`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileListResponse {
    /// Files owned by the current user.
    pub files: Vec<UploadedFile>,
}

/// Payload of `GET projects/{p}/files`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectFileListResponse {
    /// Attached files in export order.
    pub files: Vec<ProjectFile>,
}

/// Body of `PUT projects/{p}/files/{f}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectFileUpdate {
    /// New heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New highlight language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_override: Option<String>,
    /// Include or exclude the file from exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_in_export: Option<bool>,
}

/// New position of one project file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileOrder {
    /// The uploaded file.
    pub file_id: i64,
    /// Its new position.
    pub order_index: i32,
}

/// Highlighted rendering of a source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilePreview {
    /// The previewed file.
    pub file_id: i64,
    /// Its name.
    pub filename: String,
    /// Language used for highlighting.
    pub language: String,
    /// Raw text.
    pub content: String,
    /// Markup styled by [`HighlightCss`].
    pub highlighted_html: String,
    /// Number of lines in `content`.
    pub line_count: u64,
}

/// Stylesheet matching the preview markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighlightCss {
    /// CSS source.
    pub css: String,
}
