pub mod activity_service;
pub mod file_service;
pub mod file_vault;
pub mod record_service;
pub mod report_service;
pub mod request_service;
pub mod user_service;

pub use activity_service::PgActivityStore;
pub use file_service::{FileError, FileService};
pub use file_vault::{FileVault, VaultError};
pub use record_service::{RecordError, RecordStore};
pub use report_service::{DashboardStats, ReportService};
pub use request_service::{RequestWorkflow, WorkflowError};
pub use user_service::{RegistrationInput, UserStore};
