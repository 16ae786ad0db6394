//! Request and response shapes exchanged with the DocPress backend.

pub mod envelope;
pub mod export;
pub mod file;
pub mod manual;
pub mod project;
pub mod user;

pub use envelope::{ApiResponse, ErrorBody, SUCCESS_CODE};
pub use export::{ExportJob, ExportStatus};
pub use file::{
    FileListResponse, FileOrder, FilePreview, HighlightCss, ProjectFile, ProjectFileListResponse,
    ProjectFileUpdate, UploadReceipt, UploadedFile,
};
pub use manual::{
    ManualSection, SectionCreateRequest, SectionList, SectionOrder, SectionReorderRequest,
    SectionUpdateRequest,
};
pub use project::{
    CodeOptions, ManualOptions, Project, ProjectCreateRequest, ProjectCreated, ProjectListQuery,
    ProjectListResponse, ProjectType, ProjectUpdateRequest,
};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, User, UserRole};
