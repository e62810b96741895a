// app.rs - shared state and route table

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth::{CredentialVerifier, TokenSigner};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{limit_requests, record_activity, require_auth, ActivityStore, RateLimiter};
use crate::services::{FileService, FileVault, PgActivityStore, RecordStore, ReportService, RequestWorkflow, UserStore};

// Multipart framing on top of the file itself
const UPLOAD_BODY_SLACK: usize = 64 * 1024;

// Set on every response unless a handler already chose a value
const SECURITY_HEADERS: [(&str, &str); 8] = [
    ("content-security-policy", "default-src 'self'; frame-ancestors 'self'; object-src 'none'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
];

/// Everything a handler can reach
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub signer: TokenSigner,
    pub credentials: CredentialVerifier,
    pub users: UserStore,
    pub records: RecordStore,
    pub files: FileService,
    pub requests: RequestWorkflow,
    pub reports: ReportService,
    pub activity: Arc<dyn ActivityStore>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, vault: FileVault) -> Self {
        let activity: Arc<dyn ActivityStore> = Arc::new(PgActivityStore::new(pool.clone()));
        Self::with_activity_store(config, pool, vault, activity)
    }

    pub fn with_activity_store(
        config: AppConfig,
        pool: PgPool,
        vault: FileVault,
        activity: Arc<dyn ActivityStore>,
    ) -> Self {
        let signer = TokenSigner::new(&config.security);
        Self {
            credentials: CredentialVerifier::new(pool.clone(), signer.clone()),
            users: UserStore::new(pool.clone()),
            records: RecordStore::new(pool.clone()),
            files: FileService::new(pool.clone(), Arc::new(vault)),
            requests: RequestWorkflow::new(pool.clone()),
            reports: ReportService::new(pool.clone()),
            config: Arc::new(config),
            signer,
            activity,
            pool,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(protected_routes(&state));

    let router = if config.server.api_prefix.is_empty() {
        Router::new().route("/", get(root)).merge(api)
    } else {
        Router::new().route("/", get(root)).nest(&config.server.api_prefix, api)
    };

    let mut router = router
        .fallback(route_not_found)
        .with_state(state.clone())
        // Global middleware
        .layer(from_fn(method_not_allowed))
        .layer(from_fn_with_state(state.activity.clone(), record_activity));

    if config.api.enable_rate_limiting {
        let limiter = Arc::new(RateLimiter::from_config(&config.api));
        router = router.layer(from_fn_with_state(limiter, limit_requests));
    }
    if config.api.enable_response_compression {
        router = router.layer(CompressionLayer::new());
    }
    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.layer(cors_layer(&config.server.cors_origins))
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/register", post(auth::register_post))
        .route("/auth/refresh", post(auth::refresh_post))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{auth, files, records, reports, requests};

    let upload_limit = state.config.upload.max_file_size.saturating_add(UPLOAD_BODY_SLACK);

    Router::new()
        // Session
        .route("/auth/profile", get(auth::session_profile))
        .route("/auth/logout", post(auth::session_logout))
        // Records
        .route("/records", get(records::collection_get).post(records::collection_post))
        .route("/records/disposal-reminders", get(records::reminders_get))
        .route(
            "/records/:id",
            get(records::record_get)
                .put(records::record_put)
                .delete(records::record_delete),
        )
        // Files
        .route(
            "/files/upload",
            post(files::upload_post).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/record/:record_id", get(files::record_files_get))
        .route("/files/download/:id", get(files::download_get))
        .route("/files/:id", delete(files::file_delete))
        // Requests
        .route("/requests", get(requests::collection_get).post(requests::collection_post))
        .route("/requests/:id", put(requests::process_put))
        // Reports
        .route("/reports/dashboard", get(reports::dashboard_get))
        .route("/reports/activity-logs", get(reports::activity_logs_get))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed)).allow_credentials(true)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "CDMIS API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": format!("{}/health", state.config.server.api_prefix),
    }))
}

/// GET {prefix}/health - 503 while the database is unreachable
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "timestamp": now,
                "database": "connected",
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DEGRADED",
                    "timestamp": now,
                    "database": "disconnected",
                })),
            )
        }
    }
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Give the router's bare 405 the usual error body, keeping `Allow`.
async fn method_not_allowed(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let mut rendered = ApiError::method_not_allowed("Method not allowed").into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        rendered.headers_mut().insert(header::ALLOW, allow.clone());
    }
    rendered
}
