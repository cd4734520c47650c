//! Authentication for Notemark
//!
//! Dual-token credential scheme: short-lived access tokens and long-lived
//! refresh tokens, both delivered as http-only cookies. The session
//! middleware transparently renews an expired access token from a valid
//! refresh token, so browsers stay logged in across access-token expiry
//! without re-authenticating.

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod service;
pub mod session;

pub use api::{AuthApiState, auth_api_router, auth_session_router};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenPair, TokenType};
pub use middleware::{ACCESS_COOKIE, REFRESH_COOKIE, SessionState, require_session};
pub use service::{AuthError, AuthService, LoginRequest, SignupRequest};
pub use session::{
    AuthenticatedSession, CurrentUser, IdentityStore, IdentityStoreError, SessionAuthenticator,
    SessionError,
};
