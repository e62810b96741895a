//! Credential Verifier: password hashing, claim issuance and verification.
//!
//! Claims are stateless. A token stays valid until its `exp` even after
//! logout or a role change; the exposure window equals the access expiry.

pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use error::AuthError;
pub use service::{CredentialVerifier, LoginOutcome};
pub use token::{ClaimPayload, SessionClaims, TokenKind, TokenPair, TokenSigner};
