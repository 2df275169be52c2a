// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Report Server - multi-file IFC property reports over HTTP.
//!
//! A client opens a session, uploads one or more IFC files, inspects the
//! unified element table and per-file unique values, picks the columns to
//! keep, and downloads an xlsx workbook.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `POST /api/v1/sessions` - Start a session
//! - `GET|DELETE /api/v1/sessions/:id` - Summary / end the session
//! - `POST|DELETE /api/v1/sessions/:id/files` - Upload files (multipart) / clear them
//! - `GET /api/v1/sessions/:id/values?column=` - Distinct values of a column
//! - `GET /api/v1/sessions/:id/matrix?column=` - Per-file unique-value matrix
//! - `GET|PUT /api/v1/sessions/:id/selection` - Column selection
//! - `GET /api/v1/sessions/:id/preview` - Page of the filtered table
//! - `GET /api/v1/sessions/:id/export?include_matrix=` - xlsx download

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::SessionStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(Duration::from_secs(config.session_ttl_secs))),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Sessions
        .route("/api/v1/sessions", post(routes::sessions::create))
        .route(
            "/api/v1/sessions/:id",
            get(routes::sessions::summary).delete(routes::sessions::remove),
        )
        .route(
            "/api/v1/sessions/:id/files",
            post(routes::files::upload).delete(routes::files::clear),
        )
        // Report
        .route("/api/v1/sessions/:id/values", get(routes::report::values))
        .route("/api/v1/sessions/:id/matrix", get(routes::report::matrix))
        .route(
            "/api/v1/sessions/:id/selection",
            get(routes::report::selection).put(routes::report::update_selection),
        )
        .route("/api/v1/sessions/:id/preview", get(routes::report::preview))
        .route("/api/v1/sessions/:id/export", get(routes::report::export))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize logging
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tower_http=debug,ifc_report_server=debug".into());
    if config.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }

    tracing::info!(
        port = config.port,
        max_file_size_mb = config.max_file_size_mb,
        worker_threads = config.worker_threads,
        session_ttl_secs = config.session_ttl_secs,
        export_file_name = %config.export_file_name,
        "Starting IFC-Report Server"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("failed to initialize rayon thread pool")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config);

    // Drop idle sessions in the background
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let period = (sessions.ttl() / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            sessions.prune_expired().await;
        }
    });

    let app = build_router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
