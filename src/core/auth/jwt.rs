//! Token signing and verification.
//!
//! Credentials are HS256 JWTs in two classes: short-lived access tokens
//! (minutes) and long-lived refresh tokens (days). Each class has its own
//! secret, so a token can only ever verify against the class it was issued
//! as; the `token_type` claim is a second line of defense for deployments
//! that configure both classes with the same secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token lifetime (minutes)
const ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 15;

/// Default refresh token lifetime (days)
const REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 1;

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for the access-token class
    pub access_secret: String,
    /// Secret for the refresh-token class
    pub refresh_secret: String,
    /// Access token lifetime in minutes
    pub access_token_expiration_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_expiration_days: i64,
    /// `iss` claim stamped into and required of every token
    pub issuer: String,
}

impl JwtConfig {
    /// Configuration with default lifetimes for the given secret pair
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_expiration_minutes: ACCESS_TOKEN_EXPIRATION_MINUTES,
            refresh_token_expiration_days: REFRESH_TOKEN_EXPIRATION_DAYS,
            issuer: "notemark".to_string(),
        }
    }

    /// Read secrets and lifetime overrides from the environment.
    ///
    /// The two secrets are required; lifetimes and issuer fall back to the
    /// defaults when unset or unparsable.
    pub fn from_env() -> Result<Self, JwtError> {
        let access_secret =
            std::env::var("ACCESS_TOKEN_SECRET").map_err(|_| JwtError::MissingAccessSecret)?;
        let refresh_secret =
            std::env::var("REFRESH_TOKEN_SECRET").map_err(|_| JwtError::MissingRefreshSecret)?;

        let mut config = Self::new(access_secret, refresh_secret);

        if let Some(minutes) = env_i64("ACCESS_TOKEN_EXPIRATION_MINUTES") {
            config.access_token_expiration_minutes = minutes;
        }
        if let Some(days) = env_i64("REFRESH_TOKEN_EXPIRATION_DAYS") {
            config.refresh_token_expiration_days = days;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.issuer = issuer;
        }

        Ok(config)
    }

    /// Set access token lifetime in minutes
    pub fn access_token_expiration(mut self, minutes: i64) -> Self {
        self.access_token_expiration_minutes = minutes;
        self
    }

    /// Set refresh token lifetime in days
    pub fn refresh_token_expiration(mut self, days: i64) -> Self {
        self.refresh_token_expiration_days = days;
        self
    }

    /// Set the issuer claim
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Token errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("ACCESS_TOKEN_SECRET environment variable not set")]
    MissingAccessSecret,

    #[error("REFRESH_TOKEN_SECRET environment variable not set")]
    MissingRefreshSecret,

    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token type")]
    InvalidTokenType,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::InvalidToken
            }
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// Which credential class a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims embedded in every issued token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    /// Username at signing time; the store lookup remains the source of
    /// truth for what is attached to a request
    pub username: String,
    /// Credential class
    pub token_type: TokenType,
    /// Issued-at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Unique id for this token
    pub jti: String,
}

impl Claims {
    /// The subject parsed as a UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Both credentials issued at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, Unix seconds
    pub access_expires_at: i64,
    /// Refresh token expiry, Unix seconds
    pub refresh_expires_at: i64,
}

/// Signing/verification keys for one credential class
#[derive(Clone)]
struct KeySet {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeySet {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies both credential classes
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    access_keys: KeySet,
    refresh_keys: KeySet,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let access_keys = KeySet::from_secret(&config.access_secret);
        let refresh_keys = KeySet::from_secret(&config.refresh_secret);

        Self {
            config,
            access_keys,
            refresh_keys,
        }
    }

    fn keys(&self, token_type: TokenType) -> &KeySet {
        match token_type {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    fn lifetime(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => Duration::minutes(self.config.access_token_expiration_minutes),
            TokenType::Refresh => Duration::days(self.config.refresh_token_expiration_days),
        }
    }

    /// Sign a token of the given class; returns the token and its expiry
    fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        token_type: TokenType,
    ) -> Result<(String, i64), JwtError> {
        let now = Utc::now();
        let exp = (now + self.lifetime(token_type)).timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type,
            iat: now.timestamp(),
            exp,
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.keys(token_type).encoding)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, exp))
    }

    /// Verify signature, expiry, and issuer against the given class's key,
    /// then require the `token_type` claim to match
    fn check(&self, token: &str, token_type: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        // No clock-skew allowance: expired means expired
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.keys(token_type).decoding, &validation)?;

        if data.claims.token_type != token_type {
            return Err(JwtError::InvalidTokenType);
        }

        Ok(data.claims)
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<(String, i64), JwtError> {
        self.issue(user_id, username, TokenType::Access)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<(String, i64), JwtError> {
        self.issue(user_id, username, TokenType::Refresh)
    }

    /// Issue both credentials for a login
    pub fn generate_token_pair(&self, user_id: Uuid, username: &str) -> Result<TokenPair, JwtError> {
        let (access_token, access_expires_at) = self.generate_access_token(user_id, username)?;
        let (refresh_token, refresh_expires_at) = self.generate_refresh_token(user_id, username)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.check(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.check(token, TokenType::Refresh)
    }

    /// Access token lifetime in minutes (also the access cookie Max-Age)
    pub fn access_token_expiration_minutes(&self) -> i64 {
        self.config.access_token_expiration_minutes
    }

    /// Refresh token lifetime in days (also the refresh cookie Max-Age)
    pub fn refresh_token_expiration_days(&self) -> i64 {
        self.config.refresh_token_expiration_days
    }
}
