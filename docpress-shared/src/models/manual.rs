//! Sections of operation manuals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One section of an operation manual.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualSection {
    /// Section id.
    pub id: i64,
    /// Owning manual project.
    #[serde(default)]
    pub project_id: i64,
    /// Section heading.
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub body_markdown: String,
    /// Uploaded image rendered with the section.
    #[serde(default)]
    pub image_file_id: Option<i64>,
    /// Position within the manual.
    pub order_index: i32,
    /// Creation time; omitted by list endpoints.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last edit; omitted by list endpoints.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload of `GET manual/projects/{p}/sections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionList {
    /// Sections in manual order.
    pub sections: Vec<ManualSection>,
}

/// Body of `POST manual/projects/{p}/sections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionCreateRequest {
    /// Section heading.
    pub title: String,
    /// Markdown body.
    pub body_markdown: String,
    /// Optional image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_file_id: Option<i64>,
}

/// Body of `PUT manual/sections/{s}`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionUpdateRequest {
    /// New heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New Markdown body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_markdown: Option<String>,
    /// New image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_file_id: Option<i64>,
}

impl SectionUpdateRequest {
    /// Returns `true` when nothing would be changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body_markdown.is_none() && self.image_file_id.is_none()
    }
}

/// New position of one section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionOrder {
    /// Section id.
    pub id: i64,
    /// Its new position.
    pub order_index: i32,
}

/// Body of `PUT manual/projects/{p}/sections/reorder`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionReorderRequest {
    /// Every section of the project with its new position.
    pub sections: Vec<SectionOrder>,
}

impl SectionReorderRequest {
    /// Builds a reorder request assigning consecutive indexes in the given order.
    #[must_use]
    pub fn from_ids(ids: &[i64]) -> Self {
        let sections = ids
            .iter()
            .zip(0..)
            .map(|(&id, order_index)| SectionOrder { id, order_index })
            .collect();
        Self { sections }
    }
}
