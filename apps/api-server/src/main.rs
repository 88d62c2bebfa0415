//! api-server — HTTP front end for the URL Shortener workspace.
//!
//! A thin request/response collaborator over the mapping core:
//! - `POST /api/shorten` validates and shortens a URL.
//! - `GET /api/resolve/:code` looks a code up.
//! - `GET /:code` redirects to the stored URL.
//! - Storage: SQLite file (default `urls.db`) or in-memory.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # throwaway in-memory store with JSON logs
//! STORAGE_PROVIDER=memory LOG_FORMAT=json cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use domain::adapters::memory_repo::InMemoryRepo;
use domain::code::Md5CodeGenerator;
use domain::service::LinkService;
use domain::validate::validate_original_url;
use domain::{CoreError, MappingRepository, ShortCode, UrlMapping};
use serde::{Deserialize, Serialize};
use sqlite_adapter::SqliteRepo;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Local repo abstraction supporting memory or sqlite.
enum AnyRepo {
    Memory(InMemoryRepo),
    Sqlite(SqliteRepo),
}

impl AnyRepo {
    fn close(self) -> Result<(), CoreError> {
        match self {
            AnyRepo::Memory(_) => Ok(()),
            AnyRepo::Sqlite(r) => r.close(),
        }
    }
}

impl MappingRepository for AnyRepo {
    fn get(&self, code: &ShortCode) -> Result<Option<UrlMapping>, CoreError> {
        match self {
            AnyRepo::Memory(r) => r.get(code),
            AnyRepo::Sqlite(r) => r.get(code),
        }
    }

    fn upsert(&self, mapping: &UrlMapping) -> Result<(), CoreError> {
        match self {
            AnyRepo::Memory(r) => r.upsert(mapping),
            AnyRepo::Sqlite(r) => r.upsert(mapping),
        }
    }

    fn count(&self) -> Result<usize, CoreError> {
        match self {
            AnyRepo::Memory(r) => r.count(),
            AnyRepo::Sqlite(r) => r.count(),
        }
    }
}

type Service = LinkService<AnyRepo, Md5CodeGenerator>;

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
    shortlink_domain: Option<String>,
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let repo = match build_repo(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, "failed to open mapping store");
            std::process::exit(1);
        }
    };
    let service = Arc::new(LinkService::new(repo, Md5CodeGenerator::new()));
    let state = AppState {
        service: Arc::clone(&service),
        shortlink_domain: cfg.shortlink_domain.clone(),
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = router(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, "api-server listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(err = %e, "server error");
    }

    // The router and its state are gone once serve returns; close the store explicitly.
    match Arc::try_unwrap(service) {
        Ok(svc) => {
            if let Err(e) = svc.into_repo().close() {
                error!(err = %e, "failed to close mapping store");
            }
        }
        Err(_) => warn!("mapping store still in use at shutdown; dropping without close"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(err = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the store selected by config. Storage failures are fatal at startup.
fn build_repo(cfg: &config::Config) -> Result<AnyRepo, CoreError> {
    match cfg.storage_provider {
        config::StorageProvider::Sqlite => Ok(AnyRepo::Sqlite(SqliteRepo::new(&cfg.db_path)?)),
        config::StorageProvider::Memory => Ok(AnyRepo::Memory(InMemoryRepo::new())),
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/shorten", post(shorten))
        .route("/api/resolve/:code", get(resolve))
        .route("/:code", get(redirect))
        .with_state(state)
}

#[derive(Deserialize)]
struct ShortenReq {
    url: String,
}

#[derive(Serialize)]
struct ShortenOut {
    code: ShortCode,
    short_url: String,
    original_url: String,
}

#[derive(Serialize)]
struct ResolveOut {
    code: ShortCode,
    original_url: String,
}

#[derive(Serialize)]
struct HealthOut {
    status: &'static str,
    mappings: usize,
}

// Store calls are synchronous; keep them off the async workers.
async fn run_blocking<T, F>(state: &AppState, f: F) -> Result<T, CoreError>
where
    T: Send + 'static,
    F: FnOnce(&Service) -> Result<T, CoreError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| CoreError::StorageUnavailable(format!("store task failed: {e}")))?
}

fn error_response(status: StatusCode, code: &str) -> Response {
    (status, Json(http_common::json_err(code))).into_response()
}

// Single mapping from core errors to HTTP status and error body.
fn core_error_response(e: &CoreError) -> Response {
    match e {
        CoreError::EmptyUrl => error_response(StatusCode::BAD_REQUEST, "empty_url"),
        CoreError::InvalidUrl(_) => error_response(StatusCode::BAD_REQUEST, "invalid_url"),
        CoreError::InvalidCode(_) => error_response(StatusCode::BAD_REQUEST, "invalid_code"),
        CoreError::NotFound => error_response(StatusCode::NOT_FOUND, "not_found"),
        CoreError::StorageUnavailable(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "error")
        }
    }
}

fn log_failure(e: &CoreError, what: &'static str) {
    match e {
        CoreError::StorageUnavailable(_) => error!(err = %e, "{} failed", what),
        _ => warn!(err = %e, "{} rejected", what),
    }
}

async fn shorten(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ShortenReq>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(err = %rejection, "bad shorten body");
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_error_with_message(
                    "bad_request",
                    &rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    if let Err(e) = validate_original_url(&req.url) {
        log_failure(&e, "shorten");
        return core_error_response(&e);
    }

    let url = req.url.clone();
    match run_blocking(&state, move |svc| svc.shorten(&url)).await {
        Ok(code) => {
            info!(code = %code, url = %req.url, "shortened");
            let host = headers
                .get("host")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");
            let short_url =
                http_common::build_short_url(state.shortlink_domain.as_deref(), host, code.as_str());
            Json(ShortenOut {
                code,
                short_url,
                original_url: req.url,
            })
            .into_response()
        }
        Err(e) => {
            log_failure(&e, "shorten");
            core_error_response(&e)
        }
    }
}

// Shared lookup for the JSON and redirect routes. A missing mapping surfaces
// as `CoreError::NotFound`.
async fn lookup(state: &AppState, raw: String) -> Result<(ShortCode, String), CoreError> {
    let code = ShortCode::parse(raw)?;
    let key = code.clone();
    match run_blocking(state, move |svc| svc.resolve(&key)).await? {
        Some(url) => {
            info!(code = %code, redirect_to = %url, "resolve ok");
            Ok((code, url))
        }
        None => Err(CoreError::NotFound),
    }
}

async fn resolve(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match lookup(&state, code).await {
        Ok((code, original_url)) => Json(ResolveOut { code, original_url }).into_response(),
        Err(e) => {
            log_failure(&e, "resolve");
            core_error_response(&e)
        }
    }
}

// Temporary redirect: a colliding URL may later take over the code. The
// validator admits control characters in the path, which cannot go into a
// header, so such targets are only reachable through /api/resolve.
async fn redirect(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let (code, url) = match lookup(&state, code).await {
        Ok(found) => found,
        Err(e) => {
            log_failure(&e, "redirect");
            return core_error_response(&e);
        }
    };
    match HeaderValue::from_str(&url) {
        Ok(location) => {
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
        }
        Err(e) => {
            error!(code = %code, err = %e, "stored url is not a valid Location header");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "unredirectable_url")
        }
    }
}

async fn health(State(state): State<AppState>) -> Response {
    match run_blocking(&state, |svc| svc.count()).await {
        Ok(mappings) => Json(HealthOut {
            status: "ok",
            mappings,
        })
        .into_response(),
        Err(e) => {
            error!(err = %e, "health check failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    }
}
