// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File upload endpoints.

use crate::error::ApiError;
use crate::services::spool_uploads;
use crate::types::UploadResponse;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use ifc_report_processing::StepParserAdapter;
use uuid::Uuid;

/// POST /api/v1/sessions/:id/files - Upload and parse one or more .ifc files.
///
/// Files that cannot be parsed are reported with `loaded: false` and left out
/// of the report.
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let spooled = spool_uploads(&mut multipart, state.config.max_upload_bytes()).await?;

    tracing::info!(
        session = %id,
        files = spooled.uploads.len(),
        size = spooled.total_bytes,
        "Received upload"
    );

    let mut session = handle.lock().await;
    let start = std::time::Instant::now();

    // Parsing is CPU-bound; run it on the blocking pool
    let (session, files) = tokio::task::spawn_blocking(move || {
        let files = session.ingest(&StepParserAdapter, &spooled.uploads);
        drop(spooled);
        (session, files)
    })
    .await?;

    let parse_time_ms = start.elapsed().as_millis() as u64;
    let summary = session.summary();
    tracing::info!(
        session = %id,
        loaded = files.iter().filter(|f| f.loaded).count(),
        rows = summary.row_count,
        parse_time_ms,
        "Upload processed"
    );

    Ok(Json(UploadResponse {
        files,
        summary,
        parse_time_ms,
    }))
}

/// DELETE /api/v1/sessions/:id/files - Forget every file.
pub async fn clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = state.sessions.get(id).await?;
    handle.lock().await.clear_files();
    tracing::info!(session = %id, "Files cleared");
    Ok(StatusCode::NO_CONTENT)
}
