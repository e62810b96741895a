use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AuthError, SessionClaims, TokenKind, TokenSigner};
use crate::error::ApiError;
use crate::filter::DepartmentScope;
use crate::types::UserRole;

/// Authenticated caller, taken from a verified access claim
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub school_id: String,
    pub role: UserRole,
    pub department_id: Option<i64>,
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.payload.user_id,
            school_id: claims.payload.school_id,
            role: claims.payload.role,
            department_id: claims.payload.department_id,
        }
    }
}

impl AuthUser {
    /// Department visibility for this caller, honoring an explicit filter
    /// only when the caller is an Administrator.
    pub fn scope(&self, requested: Option<i64>) -> DepartmentScope {
        DepartmentScope::for_user(self.role, self.department_id, requested)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("No token provided"))
    }
}

/// Bearer-token middleware for every protected route.
///
/// The caller is placed in the request extensions for handlers and copied
/// onto the response so the activity recorder can see who acted.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate_request(request.headers(), &state.signer)?;
    request.extensions_mut().insert(user.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Verify the bearer token in `headers` as an access claim.
pub fn authenticate_request(headers: &HeaderMap, signer: &TokenSigner) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    match signer.verify(token, TokenKind::Access) {
        Ok(claims) => Ok(AuthUser::from(claims)),
        Err(AuthError::TokenExpired) => Err(ApiError::unauthorized("Token expired")),
        Err(AuthError::TokenInvalid(reason)) => {
            tracing::debug!("Rejected bearer token: {}", reason);
            Err(ApiError::unauthorized("Invalid token"))
        }
        Err(other) => Err(other.into()),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Allow iff the caller's role is in `allowed`. An empty set allows nobody.
pub fn authorize(user: &AuthUser, allowed: &[UserRole]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    tracing::warn!(
        "Access denied for user {} with role {}",
        user.user_id,
        user.role
    );
    Err(ApiError::forbidden("Insufficient permissions"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClaimPayload;
    use crate::config::AppConfig;
    use axum::http::{HeaderValue, StatusCode};

    fn signer() -> TokenSigner {
        TokenSigner::new(&AppConfig::for_tests().security)
    }

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: 1,
            school_id: "2019-00001".to_string(),
            role,
            department_id: Some(1),
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn payload() -> ClaimPayload {
        ClaimPayload {
            user_id: 5,
            school_id: "2020-55555".to_string(),
            role: UserRole::Staff,
            department_id: None,
        }
    }

    #[test]
    fn authorize_is_membership() {
        let sets: [&[UserRole]; 4] = [
            &[],
            &[UserRole::Administrator],
            &[UserRole::Administrator, UserRole::Custodian],
            &UserRole::ALL,
        ];
        for allowed in sets {
            for role in UserRole::ALL {
                assert_eq!(authorize(&user(role), allowed).is_ok(), allowed.contains(&role));
            }
        }
    }

    #[test]
    fn forbidden_is_403() {
        let err = authorize(&user(UserRole::Staff), &[]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_or_malformed_header_is_unauthenticated() {
        let signer = signer();
        let err = authenticate_request(&HeaderMap::new(), &signer).unwrap_err();
        assert_eq!(err.message(), "No token provided");

        let err = authenticate_request(&headers_with("Basic abc"), &signer).unwrap_err();
        assert_eq!(err.message(), "No token provided");

        let err = authenticate_request(&headers_with("Bearer abc.def.ghi"), &signer).unwrap_err();
        assert_eq!(err.message(), "Invalid token");
    }

    #[test]
    fn expired_and_refresh_tokens_are_refused() {
        let signer = signer();
        let expired = signer
            .issue_with_expiry(&payload(), TokenKind::Access, chrono::Utc::now().timestamp() - 5)
            .unwrap();
        let err = authenticate_request(&headers_with(&format!("Bearer {}", expired)), &signer).unwrap_err();
        assert_eq!(err.message(), "Token expired");

        let refresh = signer.issue(&payload(), TokenKind::Refresh).unwrap();
        let err = authenticate_request(&headers_with(&format!("Bearer {}", refresh)), &signer).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn valid_access_token_yields_caller() {
        let signer = signer();
        let token = signer.issue(&payload(), TokenKind::Access).unwrap();
        let caller = authenticate_request(&headers_with(&format!("Bearer {}", token)), &signer).unwrap();
        assert_eq!(caller.user_id, 5);
        assert_eq!(caller.role, UserRole::Staff);
        assert_eq!(caller.scope(Some(3)), DepartmentScope::Unassigned);
    }
}
