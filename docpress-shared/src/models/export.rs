//! Queued PDF exports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Lifecycle of a queued export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExportStatus {
    /// Waiting for a worker.
    Queued,
    /// Rendering.
    Processing,
    /// PDF ready for download.
    Success,
    /// Rendering failed; see [`ExportJob::error_message`].
    Failed,
}

impl ExportStatus {
    /// Returns `true` once the job will no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// An asynchronous PDF export tracked by the backend queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportJob {
    /// Database row id.
    pub id: i64,
    /// Project being exported.
    pub project_id: i64,
    /// Queue identifier used by the status and download endpoints.
    pub job_id: String,
    /// Current state.
    pub status: ExportStatus,
    /// Percentage complete, 0-100.
    #[serde(default)]
    pub progress: u8,
    /// Server-side location of the finished PDF.
    #[serde(default)]
    pub result_file_path: Option<String>,
    /// Failure reason when `status` is `failed`.
    #[serde(default)]
    pub error_message: Option<String>,
    /// When the job was queued.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_states() {
        assert!(!ExportStatus::Queued.is_terminal());
        assert!(!ExportStatus::Processing.is_terminal());
        assert!(ExportStatus::Success.is_terminal());
        assert!(ExportStatus::Failed.is_terminal());
    }

    #[test]
    fn export_job_from_backend_payload() {
        let job: ExportJob = serde_json::from_value(json!({
            "id": 5,
            "project_id": 2,
            "job_id": "job-abc",
            "status": "processing",
            "progress": 40,
            "created_at": "2024-05-01T08:00:00Z",
            "updated_at": "2024-05-01T08:01:00Z"
        }))
        .unwrap();
        assert_eq!(job.status, ExportStatus::Processing);
        assert_eq!(job.status.to_string(), "processing");
        assert_eq!(job.progress, 40);
        assert_eq!(job.result_file_path, None);
    }
}
