//! Account endpoints
//!
//! - POST /api/auth/signup - Register a new account
//! - POST /api/auth/login  - Login; sets both credential cookies
//! - POST /api/auth/logout - Clear credential cookies (session required)

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

use crate::core::auth::middleware::{
    ACCESS_COOKIE, REFRESH_COOKIE, access_cookie, refresh_cookie, removal_cookie,
};
use crate::core::auth::service::{AuthError, AuthService, LoginRequest, SignupRequest};
use crate::core::auth::session::CurrentUser;
use crate::core::db::models::UserResponse;

/// Auth API state
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    /// Access cookie lifetime, matches the access token expiry
    pub access_cookie_minutes: i64,
    /// Refresh cookie lifetime, matches the refresh token expiry
    pub refresh_cookie_days: i64,
    /// Whether issued cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Map auth failures onto status codes and a JSON message body
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailAlreadyExists => StatusCode::BAD_REQUEST,
            AuthError::UnknownEmail => StatusCode::NOT_FOUND,
            AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AuthError::InternalError(detail) => {
                tracing::error!("auth failure: {}", detail);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError {
                        message: "Internal server error".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        let body = ApiError {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Response for successful registration
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Response for successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

/// Body returned by logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Create the public auth API router (no session required)
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler))
        .with_state(state)
}

/// Create the session-guarded auth router; the caller layers the session
/// middleware on top
pub fn auth_session_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/auth/logout", post(logout_handler))
        .with_state(state)
}

/// POST /api/auth/signup
async fn signup_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AuthError> {
    tracing::info!("Registration attempt for email: {}", request.email);

    let user = state.auth_service.signup(request).await?;

    tracing::info!("User registered successfully: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// POST /api/auth/login
/// Issues both credential cookies on success
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    tracing::info!("Login attempt for email: {}", request.email);

    let outcome = state.auth_service.login(request).await?;

    let jar = jar
        .add(access_cookie(
            outcome.tokens.access_token,
            state.access_cookie_minutes,
            state.secure_cookies,
        ))
        .add(refresh_cookie(
            outcome.tokens.refresh_token,
            state.refresh_cookie_days,
            state.secure_cookies,
        ));

    tracing::info!("User logged in successfully: {}", outcome.user.email);

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            message: "user logged in successfully".to_string(),
            user: outcome.user,
        }),
    ))
}

/// POST /api/auth/logout
/// Clears both credential cookies; the refresh token keeps no server-side
/// state, so expiring the cookies is the whole operation
async fn logout_handler(
    State(state): State<Arc<AuthApiState>>,
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    tracing::info!("Logout for user {}", user.id);

    let jar = jar
        .add(removal_cookie(ACCESS_COOKIE, state.secure_cookies))
        .add(removal_cookie(REFRESH_COOKIE, state.secure_cookies));

    (
        jar,
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Response Serialization Tests
    // ========================================================================

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError {
            message: "Email not registered".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();

        assert_eq!(json, r#"{"message":"Email not registered"}"#);
    }

    #[test]
    fn test_login_response_serialization() {
        use chrono::Utc;
        use uuid::Uuid;

        let response = LoginResponse {
            success: true,
            message: "user logged in successfully".to_string(),
            user: UserResponse {
                id: Uuid::new_v4(),
                username: "testuser".to_string(),
                email: "test@example.com".to_string(),
                created_at: Utc::now(),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""success":true"#));
        assert!(json.contains("user logged in successfully"));
        assert!(json.contains("testuser"));
    }

    #[test]
    fn test_logout_response_serialization() {
        let response = LogoutResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("Logged out successfully"));
    }
}
