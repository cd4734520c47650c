//! Session middleware and request-identity extraction
//!
//! Applies the session authenticator to protected routers via
//! `axum::middleware::from_fn_with_state`. On success the resolved
//! `CurrentUser` is inserted into request extensions for handlers to
//! extract; if the authenticator minted a replacement access token, it is
//! written back to the response as a cookie here, keeping the
//! authenticator itself free of response-mutation side effects.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use crate::core::auth::session::{CurrentUser, SessionAuthenticator, SessionError};

/// Cookie carrying the short-lived access token
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie carrying the long-lived refresh token
pub const REFRESH_COOKIE: &str = "refresh_token";

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Internal(detail) => {
                tracing::error!("session authentication fault: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        };

        let body = ApiError {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// State for the session middleware
#[derive(Clone)]
pub struct SessionState {
    pub authenticator: SessionAuthenticator,
    /// Whether issued cookies carry the `Secure` attribute (production)
    pub secure_cookies: bool,
}

/// Build a session cookie with the attributes every credential cookie
/// shares: http-only, strict same-site, path "/"
fn session_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(max_age)
        .path("/")
        .build()
}

/// Access-token cookie with the given lifetime in minutes
pub fn access_cookie(token: String, minutes: i64, secure: bool) -> Cookie<'static> {
    session_cookie(
        ACCESS_COOKIE,
        token,
        time::Duration::minutes(minutes),
        secure,
    )
}

/// Refresh-token cookie with the given lifetime in days
pub fn refresh_cookie(token: String, days: i64, secure: bool) -> Cookie<'static> {
    session_cookie(REFRESH_COOKIE, token, time::Duration::days(days), secure)
}

/// Immediately-expiring cookie used to clear a credential on logout
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    session_cookie(name, String::new(), time::Duration::ZERO, secure)
}

/// Middleware guarding protected routes.
///
/// Rejections never reach the inner handler; the downstream handler runs
/// only with a `CurrentUser` extension in place.
pub async fn require_session(
    State(state): State<SessionState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, SessionError> {
    let access = jar.get(ACCESS_COOKIE).map(|c| c.value().to_string());
    let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());

    let session = state
        .authenticator
        .authenticate(access.as_deref(), refresh.as_deref())
        .await?;

    req.extensions_mut().insert(session.user);

    let response = next.run(req).await;

    match session.reissued_access {
        Some(token) => {
            let minutes = state.authenticator.access_token_expiration_minutes();
            let jar = jar.add(access_cookie(token, minutes, state.secure_cookies));
            Ok((jar, response).into_response())
        }
        None => Ok(response),
    }
}

/// Extractor giving handlers typed access to the identity resolved by
/// `require_session`. A missing extension means the route was not behind
/// the middleware; that is the handler's own 401.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(SessionError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::jwt::{JwtConfig, JwtService};
    use crate::core::auth::session::{IdentityStore, IdentityStoreError};
    use async_trait::async_trait;
    use axum::{Router, body::Body, http::header, middleware, routing::get};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct FakeStore {
        users: HashMap<Uuid, CurrentUser>,
    }

    #[async_trait]
    impl IdentityStore for FakeStore {
        async fn find_identity(
            &self,
            id: Uuid,
        ) -> Result<Option<CurrentUser>, IdentityStoreError> {
            Ok(self.users.get(&id).cloned())
        }
    }

    fn test_jwt() -> JwtService {
        JwtService::new(JwtConfig::new("mw_access_secret", "mw_refresh_secret"))
    }

    fn expired_access_jwt() -> JwtService {
        JwtService::new(
            JwtConfig::new("mw_access_secret", "mw_refresh_secret").access_token_expiration(-10),
        )
    }

    async fn whoami(user: CurrentUser) -> String {
        user.username
    }

    fn test_app(user_id: Uuid, username: &str) -> Router {
        let mut users = HashMap::new();
        users.insert(
            user_id,
            CurrentUser {
                id: user_id,
                username: username.to_string(),
            },
        );

        let state = SessionState {
            authenticator: SessionAuthenticator::new(test_jwt(), Arc::new(FakeStore { users })),
            secure_cookies: false,
        };

        Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(state, require_session))
    }

    fn request_with_cookies(cookies: &str) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ========================================================================
    // Rejection Responses
    // ========================================================================

    #[tokio::test]
    async fn test_no_cookies_gets_401_and_no_set_cookie() {
        let app = test_app(Uuid::new_v4(), "alice");

        let response = app.oneshot(request_with_cookies("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["message"], "No token provided");
    }

    #[tokio::test]
    async fn test_refresh_for_unknown_user_gets_401_user_not_found() {
        let app = test_app(Uuid::new_v4(), "alice");

        // Refresh token for a subject the store has never seen
        let (refresh, _) = test_jwt()
            .generate_refresh_token(Uuid::new_v4(), "ghost")
            .unwrap();

        let response = app
            .oneshot(request_with_cookies(&format!("refresh_token={}", refresh)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn test_expired_access_without_refresh_gets_401() {
        let user_id = Uuid::new_v4();
        let app = test_app(user_id, "alice");

        let (expired, _) = expired_access_jwt()
            .generate_access_token(user_id, "alice")
            .unwrap();

        let response = app
            .oneshot(request_with_cookies(&format!("access_token={}", expired)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Access token expired or invalid");
    }

    // ========================================================================
    // Resolution Responses
    // ========================================================================

    #[tokio::test]
    async fn test_valid_access_reaches_handler_without_set_cookie() {
        let user_id = Uuid::new_v4();
        let app = test_app(user_id, "alice");

        let (access, _) = test_jwt().generate_access_token(user_id, "alice").unwrap();

        let response = app
            .oneshot(request_with_cookies(&format!("access_token={}", access)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"alice");
    }

    #[tokio::test]
    async fn test_renewal_sets_access_cookie_and_reaches_handler() {
        let user_id = Uuid::new_v4();
        let app = test_app(user_id, "alice");

        let (expired, _) = expired_access_jwt()
            .generate_access_token(user_id, "alice")
            .unwrap();
        let (refresh, _) = test_jwt()
            .generate_refresh_token(user_id, "alice")
            .unwrap();

        let response = app
            .oneshot(request_with_cookies(&format!(
                "access_token={}; refresh_token={}",
                expired, refresh
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("expected a reissued access cookie")
            .to_str()
            .unwrap()
            .to_string();

        assert!(set_cookie.starts_with("access_token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
        assert!(set_cookie.contains("Max-Age=900"));
        // secure_cookies=false in tests
        assert!(!set_cookie.contains("Secure"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"alice");
    }

    // ========================================================================
    // Cookie Builders
    // ========================================================================

    #[test]
    fn test_access_cookie_attributes() {
        let cookie = access_cookie("tok".to_string(), 15, true);

        assert_eq!(cookie.name(), ACCESS_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(15)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(REFRESH_COOKIE, false);

        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
