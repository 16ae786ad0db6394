//! Projects and their listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Kind of document a project produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectType {
    /// Source listing rendered with syntax highlighting.
    Code,
    /// Operation manual assembled from ordered sections.
    Manual,
}

/// A project owned by the current user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Project id.
    pub id: i64,
    /// Display name.
    pub project_name: String,
    /// What the project exports.
    pub project_type: ProjectType,
    /// Owning account.
    #[serde(default)]
    pub owner_id: i64,
    /// Raw JSON configuration string as stored by the backend.
    #[serde(default)]
    pub config_json: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Parses `config_json`, returning `Value::Null` when it is empty or malformed.
    #[must_use]
    pub fn config(&self) -> Value {
        serde_json::from_str(&self.config_json).unwrap_or(Value::Null)
    }
}

/// Formatting options for code projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeOptions {
    /// Formatting switches such as `line_numbers`.
    pub formatting: Vec<String>,
    /// Page layout name.
    pub layout: String,
    /// Font size, e.g. `10pt`.
    pub font_size: String,
    /// Extra export switches such as `toc`.
    pub export_options: Vec<String>,
}

/// Template options for manual projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualOptions {
    /// Template name.
    pub template: String,
    /// Titles of sections created with the project.
    pub default_sections: Vec<String>,
}

/// Body of `POST projects`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectCreateRequest {
    /// Display name.
    pub project_name: String,
    /// What the project exports.
    pub project_type: ProjectType,
    /// Only meaningful for code projects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_options: Option<CodeOptions>,
    /// Only meaningful for manual projects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_options: Option<ManualOptions>,
}

impl ProjectCreateRequest {
    /// Creates a request with no type-specific options.
    #[must_use]
    pub fn new(project_name: impl Into<String>, project_type: ProjectType) -> Self {
        Self {
            project_name: project_name.into(),
            project_type,
            code_options: None,
            manual_options: None,
        }
    }
}

/// Acknowledgement returned by `POST projects`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectCreated {
    /// Id of the new project.
    pub project_id: i64,
    /// Its name.
    pub project_name: String,
}

/// Body of `PUT projects/{id}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Replacement configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_json: Option<Value>,
}

/// Filters for `GET projects`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProjectListQuery {
    /// Restrict to one kind of project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Projects per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// One page of projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectListResponse {
    /// Projects on this page.
    pub projects: Vec<Project>,
    /// Total across all pages.
    pub total: u64,
    /// Page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of pages.
    pub total_pages: u32,
}
