pub mod activity;
pub mod dashboard;

// Re-export handler functions for use in routing
pub use activity::get as activity_logs_get;
pub use dashboard::get as dashboard_get;
