// handlers/protected/mod.rs - bearer-authenticated endpoints
//
// `require_auth` has already verified the access token; each handler checks
// the caller's role for its own action.

pub mod auth;
pub mod files;
pub mod records;
pub mod reports;
pub mod requests;
