//! bcrypt password hashing. Both calls are CPU-bound and run on the blocking pool.

use once_cell::sync::Lazy;

use super::AuthError;

/// Hash compared against when no account matches, so a missing account
/// costs the same as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| bcrypt::hash("cdmis-no-such-account", 10).ok());

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Spend one bcrypt verification and discard the result.
pub async fn burn_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn correct_password_matches() {
        let hash = hash_password("hunter22", 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("hunter22", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_password_does_not_match() {
        let hash = hash_password("hunter22", 4).await.unwrap();
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("hunter22", "not-a-hash").await,
            Err(AuthError::Hashing(_))
        ));
    }
}
