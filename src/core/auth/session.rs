//! Session authentication with transparent access-token renewal
//!
//! Every protected request carries up to two cookies: a short-lived access
//! token and a long-lived refresh token. A valid access token resolves the
//! caller directly. An expired or invalid access token does NOT terminate
//! the request: the refresh token, when present and valid, mints a
//! replacement access token without forcing re-login. Only when both
//! credentials fail is the request rejected.
//!
//! The authenticator never touches the response itself. It returns the
//! resolved identity plus the optional replacement token, and the
//! middleware layer applies the cookie.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::db::repositories::{UserRepository, UserRepositoryError};

/// Identity attached to a request for the duration of handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

/// Unexpected identity-store failure (connectivity, protocol), distinct
/// from "no such user"
#[derive(Debug, thiserror::Error)]
#[error("identity store failure: {0}")]
pub struct IdentityStoreError(pub String);

/// Minimal identity-store interface the session authenticator consumes
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a user by id; `None` means the account does not exist
    async fn find_identity(&self, id: Uuid) -> Result<Option<CurrentUser>, IdentityStoreError>;
}

#[async_trait]
impl IdentityStore for UserRepository {
    async fn find_identity(&self, id: Uuid) -> Result<Option<CurrentUser>, IdentityStoreError> {
        let user = self
            .find_by_id(id)
            .await
            .map_err(|e: UserRepositoryError| IdentityStoreError(e.to_string()))?;

        Ok(user.map(|u| CurrentUser {
            id: u.id,
            username: u.username,
        }))
    }
}

/// Session authentication error types.
///
/// All variants except `Internal` surface as 401 with the variant's display
/// string as the message; `Internal` surfaces as 500.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No token provided")]
    NoCredential,

    #[error("Access token expired or invalid")]
    AccessTokenInvalid,

    #[error("Refresh token expired or invalid")]
    RefreshTokenInvalid,

    #[error("User not found")]
    UserNotFound,

    #[error("Authentication failed")]
    NotAuthenticated,

    #[error("Internal server error")]
    Internal(String),
}

impl From<IdentityStoreError> for SessionError {
    fn from(err: IdentityStoreError) -> Self {
        SessionError::Internal(err.to_string())
    }
}

/// Successful authentication result
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Resolved identity, from the store
    pub user: CurrentUser,
    /// Replacement access token minted from the refresh token, if the
    /// presented access token was absent or failed verification
    pub reissued_access: Option<String>,
}

/// Outcome of checking the presented access token.
///
/// `Failed` is deliberately not an error: an access token that does not
/// verify must fall through to the refresh token rather than terminate the
/// request. Keeping the three cases in one value makes that fallthrough a
/// matter of exhaustive matching instead of early returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessCheck {
    /// No access cookie on the request
    Missing,
    /// Token verified; carries the subject id pending store resolution
    Valid(Uuid),
    /// Token presented but expired, malformed, or mis-signed
    Failed,
}

/// Validates request credentials and renews expired access tokens
#[derive(Clone)]
pub struct SessionAuthenticator {
    jwt: JwtService,
    store: Arc<dyn IdentityStore>,
}

impl SessionAuthenticator {
    /// Create a new session authenticator
    pub fn new(jwt: JwtService, store: Arc<dyn IdentityStore>) -> Self {
        Self { jwt, store }
    }

    /// Access token lifetime in minutes, for the reissued cookie's Max-Age
    pub fn access_token_expiration_minutes(&self) -> i64 {
        self.jwt.access_token_expiration_minutes()
    }

    /// Authenticate a request from its two optional token cookies.
    ///
    /// At most one credential is reissued per request (the access token),
    /// and only via the refresh path; the refresh token is never reissued
    /// here.
    pub async fn authenticate(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<AuthenticatedSession, SessionError> {
        if access_token.is_none() && refresh_token.is_none() {
            return Err(SessionError::NoCredential);
        }

        let access_check = match access_token {
            None => AccessCheck::Missing,
            Some(token) => match self.jwt.validate_access_token(token) {
                Ok(claims) => match claims.user_id() {
                    Ok(id) => AccessCheck::Valid(id),
                    Err(_) => AccessCheck::Failed,
                },
                Err(err) => {
                    tracing::debug!("access token verification failed: {}", err);
                    AccessCheck::Failed
                }
            },
        };

        if let AccessCheck::Valid(user_id) = access_check {
            let user = self
                .store
                .find_identity(user_id)
                .await?
                .ok_or(SessionError::UserNotFound)?;

            return Ok(AuthenticatedSession {
                user,
                reissued_access: None,
            });
        }

        // Access token absent or failed: the refresh token is the last
        // chance to resolve the request
        let Some(refresh) = refresh_token else {
            return Err(match access_check {
                AccessCheck::Failed => SessionError::AccessTokenInvalid,
                _ => SessionError::NotAuthenticated,
            });
        };

        let claims = self.jwt.validate_refresh_token(refresh).map_err(|err| {
            tracing::debug!("refresh token verification failed: {}", err);
            SessionError::RefreshTokenInvalid
        })?;

        let user_id = claims
            .user_id()
            .map_err(|_| SessionError::RefreshTokenInvalid)?;

        let user = self
            .store
            .find_identity(user_id)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        let (token, _) = self
            .jwt
            .generate_access_token(user.id, &user.username)
            .map_err(|e: JwtError| SessionError::Internal(e.to_string()))?;

        tracing::debug!("access token renewed for user {}", user.id);

        Ok(AuthenticatedSession {
            user,
            reissued_access: Some(token),
        })
    }
}
