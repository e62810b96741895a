pub mod audit;
pub mod auth;
pub mod rate_limit;
pub mod response;

pub use audit::{classify_operation, record_activity, ActivityStore, AuditOperation};
pub use auth::{authenticate_request, authorize, require_auth, AuthUser};
pub use rate_limit::{limit_requests, RateLimiter};
pub use response::{ApiResponse, ApiResult};
