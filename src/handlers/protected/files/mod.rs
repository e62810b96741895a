pub mod download;
pub mod file;
pub mod upload;

// Re-export handler functions for use in routing
pub use download::get as download_get;
pub use file::delete as file_delete;
pub use file::list_for_record as record_files_get;
pub use upload::post as upload_post;
