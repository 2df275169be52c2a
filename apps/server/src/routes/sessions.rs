// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session lifecycle endpoints.

use crate::error::ApiError;
use crate::types::SessionCreated;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ifc_report_processing::SessionSummary;
use uuid::Uuid;

/// POST /api/v1/sessions - Start an empty session.
pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let handle = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: handle.id,
        }),
    )
}

/// GET /api/v1/sessions/:id - Stage, files and columns.
pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(session.summary()))
}

/// DELETE /api/v1/sessions/:id - Drop the session and its tables.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}
