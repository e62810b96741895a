pub mod collection;
pub mod process;

// Re-export handler functions for use in routing
pub use collection::get as collection_get;
pub use collection::post as collection_post;
pub use process::put as process_put;
