pub mod activity_log;
pub mod document_request;
pub mod record;
pub mod record_file;
pub mod user;

pub use activity_log::{ActivityLogView, NewActivityEntry};
pub use document_request::DocumentRequestView;
pub use record::{Record, RecordInput, RecordView};
pub use record_file::{RecordFile, RecordFileView};
pub use user::{User, UserProfile, UserSummary};
