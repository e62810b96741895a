use serde::Serialize;
use sqlx::PgPool;

use super::password;
use super::token::{ClaimPayload, TokenKind, TokenPair, TokenSigner};
use super::AuthError;
use crate::database::models::{User, UserSummary};
use crate::services::user_service::UserStore;

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserSummary,
}

impl From<&User> for ClaimPayload {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            school_id: user.school_id.clone(),
            role: user.role,
            department_id: user.department_id,
        }
    }
}

/// Login and refresh. Nothing is stored server-side per session.
#[derive(Clone)]
pub struct CredentialVerifier {
    users: UserStore,
    signer: TokenSigner,
}

impl CredentialVerifier {
    pub fn new(pool: PgPool, signer: TokenSigner) -> Self {
        Self {
            users: UserStore::new(pool),
            signer,
        }
    }

    pub async fn authenticate(&self, identifier: &str, secret: &str) -> Result<LoginOutcome, AuthError> {
        let account = self.users.find_by_school_id(identifier).await?;
        let user = check_credentials(account, secret).await?;

        let tokens = self.signer.issue_pair(&ClaimPayload::from(&user))?;
        tracing::info!("User logged in: {}", user.school_id);

        Ok(LoginOutcome {
            tokens,
            user: UserSummary::from(&user),
        })
    }

    /// Re-issue both claims for the identity embedded in a valid refresh claim.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh)?;
        self.signer.issue_pair(&claims.payload)
    }
}

/// Compare the secret against the stored hash. A missing account and a
/// wrong secret both yield `Rejected` after the same amount of hashing work.
pub async fn check_credentials(account: Option<User>, secret: &str) -> Result<User, AuthError> {
    let Some(user) = account else {
        password::burn_verification(secret).await;
        tracing::warn!("Login rejected: unknown account");
        return Err(AuthError::Rejected);
    };

    match password::verify_password(secret, &user.password_hash).await {
        Ok(true) => Ok(user),
        Ok(false) => {
            tracing::warn!("Login rejected: wrong password for {}", user.school_id);
            Err(AuthError::Rejected)
        }
        Err(e) => {
            tracing::error!("Stored password hash for {} is unusable: {}", user.school_id, e);
            Err(AuthError::Rejected)
        }
    }
}
