// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub active_sessions: usize,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const fn endpoint(
    method: &'static str,
    path: &'static str,
    description: &'static str,
) -> EndpointInfo {
    EndpointInfo {
        method,
        path,
        description,
    }
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "ifc-report-server",
        active_sessions: state.sessions.len().await,
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "ifc-report-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Multi-file IFC property reports with xlsx export",
        endpoints: vec![
            endpoint("GET", "/api/v1/health", "Health check endpoint"),
            endpoint("POST", "/api/v1/sessions", "Start a report session"),
            endpoint("GET", "/api/v1/sessions/:id", "Session summary"),
            endpoint("DELETE", "/api/v1/sessions/:id", "End a session"),
            endpoint("POST", "/api/v1/sessions/:id/files", "Upload .ifc files (multipart)"),
            endpoint("DELETE", "/api/v1/sessions/:id/files", "Remove all files"),
            endpoint("GET", "/api/v1/sessions/:id/values?column=", "Distinct values of a column"),
            endpoint("GET", "/api/v1/sessions/:id/matrix?column=", "Per-file unique-value matrix"),
            endpoint("GET", "/api/v1/sessions/:id/selection", "Column selection"),
            endpoint("PUT", "/api/v1/sessions/:id/selection", "Change the column selection"),
            endpoint("GET", "/api/v1/sessions/:id/preview", "Page of the filtered table"),
            endpoint("GET", "/api/v1/sessions/:id/export", "Download the xlsx report"),
        ],
    })
}
