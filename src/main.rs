//! Main entry point for the Notemark backend.
//!
//! Initializes configuration, the database pool, and the Axum router, then
//! serves the API. Protected feature routers sit behind the session
//! middleware; only the liveness routes and signup/login are public.

use axum::{Json, Router, extract::State, http::StatusCode, middleware, routing::get};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use notemark::core::auth::{
    AuthApiState, AuthService, JwtService, SessionAuthenticator, SessionState, auth_api_router,
    auth_session_router, require_session,
};
use notemark::core::config::AppConfig;
use notemark::core::db::{
    BudgetRepository, DbConfig, ExpenseRepository, NoteRepository, PgPool, UploadRepository,
    UserRepository, create_pool_with_migrations, pool::health_check,
};
use notemark::core::expenses::{ExpenseApiState, expense_api_router};
use notemark::core::grammar::GrammarClient;
use notemark::core::notes::{NoteApiState, note_api_router};
use notemark::core::uploads::{ObjectStorage, UploadApiState, upload_api_router};

/// Whole-request deadline; a hung identity-store or upstream call fails the
/// request instead of holding the connection forever
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("configuration error: {}", err);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Config loaded: environment={:?}, port={}, storage_configured={}",
        config.environment,
        config.port,
        config.storage.is_configured()
    );

    let pool = match create_pool_with_migrations(&DbConfig::new(&config.database_url)).await {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!("database setup failed: {}", err);
            std::process::exit(1);
        }
    };

    let app = build_app(&config, pool);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

/// Assemble the application router
fn build_app(config: &AppConfig, pool: PgPool) -> Router {
    let users = UserRepository::new(pool.clone());
    let jwt = JwtService::new(config.jwt.clone());
    let secure_cookies = config.is_production();

    let session_state = SessionState {
        authenticator: SessionAuthenticator::new(jwt.clone(), Arc::new(users.clone())),
        secure_cookies,
    };

    let auth_state = AuthApiState {
        auth_service: AuthService::new(users, jwt),
        access_cookie_minutes: config.jwt.access_token_expiration_minutes,
        refresh_cookie_days: config.jwt.refresh_token_expiration_days,
        secure_cookies,
    };

    // Every feature router behind the session gate
    let protected = Router::new()
        .merge(note_api_router(NoteApiState {
            notes: NoteRepository::new(pool.clone()),
            grammar: GrammarClient::new(config.grammar.clone()),
        }))
        .merge(upload_api_router(UploadApiState {
            uploads: UploadRepository::new(pool.clone()),
            storage: ObjectStorage::new(config.storage.clone()),
        }))
        .merge(expense_api_router(ExpenseApiState {
            expenses: ExpenseRepository::new(pool.clone()),
            budgets: BudgetRepository::new(pool.clone()),
        }))
        .merge(auth_session_router(auth_state.clone()))
        .layer(middleware::from_fn_with_state(
            session_state,
            require_session,
        ));

    let app = Router::new()
        .route("/", get(root_handler))
        .merge(
            Router::new()
                .route("/health", get(health_handler))
                .with_state(pool),
        )
        .merge(auth_api_router(auth_state))
        .merge(protected)
        .layer(cors_layer(config))
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Best),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)));

    apply_security_headers(app)
}

/// CORS policy: permissive in development, exact-match allowlist from
/// CORS_ALLOWED_ORIGINS in production. An empty production allowlist
/// allows no origins at all.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    use axum::http::{HeaderValue, Method, header};

    let cors = if config.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        CorsLayer::new().allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _req| allowed.iter().any(|v| v == origin),
        ))
    } else {
        CorsLayer::new().allow_origin(Any)
    };

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Apply common security headers to all responses
fn apply_security_headers(router: Router) -> Router {
    use axum::http::header::{HeaderName, HeaderValue};

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("no-referrer"),
        ))
}

/// GET /
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Server is running successfully!" }))
}

/// GET /health
async fn health_handler(State(pool): State<PgPool>) -> Result<Json<serde_json::Value>, StatusCode> {
    health_check(&pool)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(json!({ "status": "ok" })))
}
