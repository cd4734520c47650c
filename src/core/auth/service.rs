//! Signup and login business logic.
//!
//! Sits between the auth API handlers and the user repository: validates
//! input, delegates persistence, and issues the credential pair on a
//! successful login.

use crate::core::auth::jwt::{JwtError, JwtService, TokenPair};
use crate::core::db::models::UserResponse;
use crate::core::db::repositories::{UserRepository, UserRepositoryError};
use crate::core::validation::{validate_email, validate_password, validate_username};

/// Errors surfaced by signup and login
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Email not registered")]
    UnknownEmail,

    #[error("Invalid password!")]
    InvalidPassword,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            UserRepositoryError::NotFound => AuthError::UnknownEmail,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<crate::core::validation::ValidationError> for AuthError {
    fn from(err: crate::core::validation::ValidationError) -> Self {
        AuthError::Validation(err.0)
    }
}

/// Signup payload
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login payload
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login: the public user plus the credential pair to be set as
/// cookies by the API layer
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

/// Coordinates the user repository and the token service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: UserRepository, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    /// Validate the payload and create the account
    pub async fn signup(&self, request: SignupRequest) -> Result<UserResponse, AuthError> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        // Password is hashed inside the repository
        let user = self
            .users
            .create(&request.username, &request.email, &request.password)
            .await?;

        Ok(user.into())
    }

    /// Authenticate an existing user and issue a fresh credential pair
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        let valid = UserRepository::verify_password(&request.password, &user.password_hash)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        if !valid {
            return Err(AuthError::InvalidPassword);
        }

        let tokens = self.jwt.generate_token_pair(user.id, &user.username)?;

        Ok(LoginOutcome {
            user: user.into(),
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Error Conversion Tests
    // ========================================================================

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            format!("{}", AuthError::EmailAlreadyExists),
            "Email already exists"
        );
        assert_eq!(
            format!("{}", AuthError::UnknownEmail),
            "Email not registered"
        );
        assert_eq!(
            format!("{}", AuthError::InvalidPassword),
            "Invalid password!"
        );
        assert_eq!(
            format!("{}", AuthError::Validation("Email is required.".to_string())),
            "Email is required."
        );
    }

    #[test]
    fn test_auth_error_from_user_repository_error() {
        let err: AuthError = UserRepositoryError::EmailAlreadyExists.into();
        assert!(matches!(err, AuthError::EmailAlreadyExists));

        let err: AuthError = UserRepositoryError::NotFound.into();
        assert!(matches!(err, AuthError::UnknownEmail));

        let err: AuthError = UserRepositoryError::HashingError("boom".to_string()).into();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    #[test]
    fn test_auth_error_from_jwt_error() {
        let err: AuthError = JwtError::InvalidToken.into();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    // ========================================================================
    // Request Deserialization Tests
    // ========================================================================

    #[test]
    fn test_signup_request_deserialization() {
        let json = r#"{
            "username": "testuser",
            "email": "user@example.com",
            "password": "Password123"
        }"#;

        let request: SignupRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "testuser");
        assert_eq!(request.email, "user@example.com");
        assert_eq!(request.password, "Password123");
    }

    #[test]
    fn test_login_request_deserialization() {
        let json = r#"{
            "email": "user@example.com",
            "password": "Password123"
        }"#;

        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.email, "user@example.com");
    }
}
