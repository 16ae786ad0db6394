//! HTTP client for the DocPress backend.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, multipart};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use shared::config::ClientConfig;
use shared::models::{
    ApiResponse, ErrorBody, ExportJob, FileListResponse, FileOrder, FilePreview, HighlightCss,
    LoginRequest, LoginResponse, ManualSection, Project, ProjectCreateRequest, ProjectCreated,
    ProjectFileListResponse, ProjectFileUpdate, ProjectListQuery, ProjectListResponse,
    ProjectUpdateRequest, RegisterRequest, SectionCreateRequest, SectionList,
    SectionReorderRequest, SectionUpdateRequest, UploadReceipt, User,
};
use std::{path::Path, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use crate::storage::{TOKEN_KEY, TokenStorage};

const USER_AGENT: &str = concat!("docpress-client/", env!("CARGO_PKG_VERSION"));
const EVENT_CAPACITY: usize = 16;

/// Failures surfaced by [`ApiClient`] calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout, or body transfer failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// An endpoint path did not form a valid URL.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP 401; the persisted token has already been purged.
    #[error("session expired or invalid")]
    Unauthorized,

    /// Any other non-success HTTP status.
    #[error("server responded with {status}: {message}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Message or detail from the body, else the raw body.
        message: String,
    },

    /// The call reached the backend but it reported a non-zero code.
    #[error("{message}")]
    Rejected {
        /// Application code from the envelope.
        code: i64,
        /// Envelope message.
        message: String,
    },

    /// Code 0 but the envelope had no `data`.
    #[error("response carried no data")]
    MissingData,

    /// The body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A file to upload could not be read.
    #[error("failed to read upload {path}: {source}")]
    Upload {
        /// Local path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Returns `true` when the failure means the credential is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Notifications raised by the client outside any single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEvent {
    /// Some response came back with HTTP 401; the persisted token was purged.
    Unauthorized,
}

/// Authentication calls the session store depends on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    /// Returns an error if the request fails or the backend rejects it.
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// Creates an account; does not sign in.
    ///
    /// # Errors
    /// See [`AuthApi::login`].
    async fn register(&self, details: &RegisterRequest) -> Result<(), ApiError>;

    /// Fetches the profile belonging to the persisted token.
    ///
    /// # Errors
    /// See [`AuthApi::login`].
    async fn current_user(&self) -> Result<User, ApiError>;
}

/// HTTP client for the DocPress `/api/v1` surface.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
    storage: Arc<dyn TokenStorage>,
    events: broadcast::Sender<ApiEvent>,
}

impl ApiClient {
    /// Creates a client from configuration, reading the bearer token from `storage`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            base_url: config.api_root(),
            client,
            storage,
            events,
        })
    }

    /// Root the endpoint paths are joined onto; always ends with `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Subscribes to client-wide events such as 401 responses.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.events.subscribe()
    }

    fn api_url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.storage.get(TOKEN_KEY) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn handle_unauthorized(&self) {
        warn!("received 401 from API; purging persisted token");
        if let Err(err) = self.storage.remove(TOKEN_KEY) {
            warn!(error = %err, "failed to remove persisted token");
        }
        // No receivers simply means nobody is listening yet.
        let _ = self.events.send(ApiEvent::Unauthorized);
    }

    /// Sends a request and applies the shared status handling.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!(url = %response.url(), %status, "API response");

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.describe())
                .unwrap_or(body);
            return Err(ApiError::Status { status, message });
        }
        Ok(response)
    }

    async fn envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        if !envelope.is_success() {
            return Err(ApiError::Rejected {
                code: envelope.code,
                message: envelope.message,
            });
        }
        Ok(envelope)
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.envelope::<T>(request)
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    /// Runs a call whose payload is irrelevant and returns the backend message.
    async fn acknowledge(&self, request: RequestBuilder) -> Result<String, ApiError> {
        Ok(self.envelope::<Value>(request).await?.message)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.get(self.api_url(path)?))
    }

    fn post<B>(&self, path: &str, body: &B) -> Result<RequestBuilder, ApiError>
    where
        B: Serialize + ?Sized,
    {
        Ok(self.client.post(self.api_url(path)?).json(body))
    }

    fn post_empty(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.post(self.api_url(path)?))
    }

    fn put<B>(&self, path: &str, body: &B) -> Result<RequestBuilder, ApiError>
    where
        B: Serialize + ?Sized,
    {
        Ok(self.client.put(self.api_url(path)?).json(body))
    }

    fn delete(&self, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.delete(self.api_url(path)?))
    }

    // Projects

    /// `POST projects`.
    ///
    /// # Errors
    /// Fails on transport errors, non-success statuses, or a non-zero code.
    pub async fn create_project(
        &self,
        request: &ProjectCreateRequest,
    ) -> Result<ProjectCreated, ApiError> {
        self.data(self.post("projects", request)?).await
    }

    /// One page of the caller's projects, optionally filtered by type.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn list_projects(
        &self,
        query: &ProjectListQuery,
    ) -> Result<ProjectListResponse, ApiError> {
        self.data(self.get("projects")?.query(query)).await
    }

    /// `GET projects/{id}`.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        self.data(self.get(&format!("projects/{id}"))?).await
    }

    /// Renames a project or replaces its configuration.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn update_project(
        &self,
        id: i64,
        request: &ProjectUpdateRequest,
    ) -> Result<Project, ApiError> {
        self.data(self.put(&format!("projects/{id}"), request)?)
            .await
    }

    /// Deletes a project and returns the backend's message.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn delete_project(&self, id: i64) -> Result<String, ApiError> {
        self.acknowledge(self.delete(&format!("projects/{id}"))?)
            .await
    }

    /// Renders the project synchronously and returns the PDF bytes.
    ///
    /// # Errors
    /// Fails on transport errors or a non-success status.
    pub async fn export_project_pdf(&self, id: i64, options: &Value) -> Result<Vec<u8>, ApiError> {
        let request = self.post(&format!("projects/{id}/export/pdf"), options)?;
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // Files

    /// Uploads a local file as multipart field `file`.
    ///
    /// # Errors
    /// Returns [`ApiError::Upload`] if the file cannot be read, otherwise as
    /// [`ApiClient::create_project`].
    pub async fn upload_file(&self, path: &Path) -> Result<UploadReceipt, ApiError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::Upload {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        let part = multipart::Part::bytes(contents).file_name(file_name);
        let form = multipart::Form::new().part("file", part);
        let request = self
            .client
            .post(self.api_url("files/upload")?)
            .multipart(form);
        self.data(request).await
    }

    /// Files uploaded by the current user.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn list_files(&self) -> Result<FileListResponse, ApiError> {
        self.data(self.get("files")?).await
    }

    /// Deletes an upload.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn delete_file(&self, file_id: i64) -> Result<String, ApiError> {
        self.acknowledge(self.delete(&format!("files/{file_id}"))?)
            .await
    }

    /// Highlighted preview, optionally forcing the highlight language.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn preview_file(
        &self,
        file_id: i64,
        language: Option<&str>,
    ) -> Result<FilePreview, ApiError> {
        let mut request = self.get(&format!("files/{file_id}/preview"))?;
        if let Some(language) = language {
            request = request.query(&[("language", language)]);
        }
        self.data(request).await
    }

    /// Attaches an upload to a project.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn add_file_to_project(
        &self,
        project_id: i64,
        file_id: i64,
    ) -> Result<String, ApiError> {
        let request = self.post_empty(&format!("projects/{project_id}/files/{file_id}"))?;
        self.acknowledge(request).await
    }

    /// Files attached to a project, in export order.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn project_files(
        &self,
        project_id: i64,
    ) -> Result<ProjectFileListResponse, ApiError> {
        self.data(self.get(&format!("projects/{project_id}/files"))?)
            .await
    }

    /// Detaches a file; the upload itself is kept.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn remove_file_from_project(
        &self,
        project_id: i64,
        file_id: i64,
    ) -> Result<String, ApiError> {
        let path = format!("projects/{project_id}/files/{file_id}");
        self.acknowledge(self.delete(&path)?).await
    }

    /// Changes how an attached file is exported.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn update_project_file(
        &self,
        project_id: i64,
        file_id: i64,
        update: &ProjectFileUpdate,
    ) -> Result<String, ApiError> {
        let path = format!("projects/{project_id}/files/{file_id}");
        self.acknowledge(self.put(&path, update)?).await
    }

    /// Sets the export order of a project's files.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn reorder_project_files(
        &self,
        project_id: i64,
        orders: &[FileOrder],
    ) -> Result<String, ApiError> {
        let path = format!("projects/{project_id}/files/reorder");
        self.acknowledge(self.put(&path, orders)?).await
    }

    /// Stylesheet for [`FilePreview::highlighted_html`].
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn highlight_css(&self) -> Result<HighlightCss, ApiError> {
        self.data(self.get("files/highlight/css")?).await
    }

    // Manual sections

    /// Appends a section to a manual project.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn create_section(
        &self,
        project_id: i64,
        request: &SectionCreateRequest,
    ) -> Result<ManualSection, ApiError> {
        self.data(self.post(&format!("manual/projects/{project_id}/sections"), request)?)
            .await
    }

    /// Sections of a manual project, in order.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn list_sections(&self, project_id: i64) -> Result<Vec<ManualSection>, ApiError> {
        let list: SectionList = self
            .data(self.get(&format!("manual/projects/{project_id}/sections"))?)
            .await?;
        Ok(list.sections)
    }

    /// `GET manual/sections/{s}`.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn get_section(&self, section_id: i64) -> Result<ManualSection, ApiError> {
        self.data(self.get(&format!("manual/sections/{section_id}"))?)
            .await
    }

    /// Edits a section; absent fields are kept.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn update_section(
        &self,
        section_id: i64,
        request: &SectionUpdateRequest,
    ) -> Result<ManualSection, ApiError> {
        self.data(self.put(&format!("manual/sections/{section_id}"), request)?)
            .await
    }

    /// Deletes a section.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn delete_section(&self, section_id: i64) -> Result<String, ApiError> {
        self.acknowledge(self.delete(&format!("manual/sections/{section_id}"))?)
            .await
    }

    /// Sets the order of a manual's sections.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn reorder_sections(
        &self,
        project_id: i64,
        request: &SectionReorderRequest,
    ) -> Result<String, ApiError> {
        let path = format!("manual/projects/{project_id}/sections/reorder");
        self.acknowledge(self.put(&path, request)?).await
    }

    // Exports

    /// Queues an asynchronous export of the project.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn export_project(&self, project_id: i64) -> Result<ExportJob, ApiError> {
        self.data(self.post_empty(&format!("projects/{project_id}/export"))?)
            .await
    }

    /// Current state of an export job.
    ///
    /// # Errors
    /// See [`ApiClient::create_project`].
    pub async fn export_status(&self, job_id: &str) -> Result<ExportJob, ApiError> {
        self.data(self.get(&format!("exports/{job_id}"))?).await
    }

    /// Direct link to a finished export's PDF.
    ///
    /// # Errors
    /// Returns an error if `job_id` cannot form a valid URL.
    pub fn download_url(&self, job_id: &str) -> Result<Url, ApiError> {
        self.api_url(&format!("exports/{job_id}/download"))
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.data(self.post("auth/token", credentials)?).await
    }

    async fn register(&self, details: &RegisterRequest) -> Result<(), ApiError> {
        self.acknowledge(self.post("auth/register", details)?)
            .await
            .map(|_| ())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.data(self.get("users/me")?).await
    }
}
