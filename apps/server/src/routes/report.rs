// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Report endpoints: column values, matrix, selection, preview and export.

use crate::error::ApiError;
use crate::types::{
    ColumnQuery, ExportQuery, MatrixResponse, PreviewQuery, PreviewResponse, SelectionResponse,
    ValuesResponse,
};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::Response,
    Json,
};
use ifc_report_processing::{ReportSession, SelectionAction};
use uuid::Uuid;

fn selection_response(session: &ReportSession) -> SelectionResponse {
    let selection = session.selection();
    SelectionResponse {
        columns: selection.flags().to_vec(),
        selected_count: selection.selected_count(),
        included: selection
            .included_columns(&session.unified().table)
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

/// GET /api/v1/sessions/:id/values?column= - Sorted distinct values across files.
pub async fn values(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ColumnQuery>,
) -> Result<Json<ValuesResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    let values = session.unique_values(&query.column)?;
    Ok(Json(ValuesResponse {
        column: query.column,
        count: values.len(),
        values,
    }))
}

/// GET /api/v1/sessions/:id/matrix?column= - Per-file unique-value matrix.
///
/// The column becomes the session's matrix column for later exports.
pub async fn matrix(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ColumnQuery>,
) -> Result<Json<MatrixResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let matrix = session.choose_column(&query.column)?;
    tracing::debug!(session = %id, column = %query.column, height = matrix.height, "Matrix built");
    Ok(Json(MatrixResponse::from(matrix)))
}

/// GET /api/v1/sessions/:id/selection - Current column flags.
pub async fn selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(selection_response(&session)))
}

/// PUT /api/v1/sessions/:id/selection - Apply `select_all`, `deselect_all`,
/// `toggle` or `preset`.
///
/// A `preset` without columns uses the configured preset.
pub async fn update_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<SelectionAction>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let action = match action {
        SelectionAction::Preset { columns } if columns.is_empty() => SelectionAction::Preset {
            columns: state.config.preset_columns.clone(),
        },
        other => other,
    };

    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.apply_selection(&action)?;
    tracing::debug!(session = %id, action = ?action, "Selection updated");
    Ok(Json(selection_response(&session)))
}

/// GET /api/v1/sessions/:id/preview?offset=&limit= - Page of the filtered table.
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let limit = query.limit.unwrap_or(state.config.preview_page_size);
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    let table = session.preview(query.offset, limit)?;
    Ok(Json(PreviewResponse {
        offset: query.offset,
        limit,
        total_rows: session.unified().row_count(),
        table,
    }))
}

/// GET /api/v1/sessions/:id/export?include_matrix= - Download the xlsx report.
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let file_name = query
        .file_name
        .unwrap_or_else(|| state.config.export_file_name.clone());
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;

    let (_session, workbook) = tokio::task::spawn_blocking(move || {
        let workbook = session.export(query.include_matrix, &file_name);
        (session, workbook)
    })
    .await?;
    let workbook = workbook?;

    tracing::info!(
        session = %id,
        file = %workbook.file_name,
        sheets = workbook.sheets.len(),
        size = workbook.bytes.len(),
        "Report exported"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        workbook.file_name.replace(['"', '\\'], "_")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"ifc_report.xlsx\""));

    Response::builder()
        .header(header::CONTENT_TYPE, workbook.mime)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(workbook.bytes))
        .map_err(|e| ApiError::Export(e.to_string()))
}
