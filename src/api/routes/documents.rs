//! Spreadsheet processing handler.

use super::headers::{ROWS_FAILED, ROWS_SUCCEEDED, ROWS_TOTAL};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::table::XLSX_MIME;
use crate::types::Requester;
use crate::worker::UploadedDocument;
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};

/// POST /documents - Paraphrase every row of an uploaded spreadsheet
///
/// Multipart fields: `file` (the workbook) and `user_id`. The response body
/// is the annotated `.xlsx`.
#[utoipa::path(
    post,
    path = "/documents",
    tag = "documents",
    request_body(content = Vec<u8>, description = "Multipart form with `file` and `user_id`", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Annotated workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Missing file or user_id", body = crate::error::ApiError),
        (status = 403, description = "User not registered", body = crate::error::ApiError),
        (status = 415, description = "Not an Excel file", body = crate::error::ApiError),
        (status = 422, description = "Missing text column or unreadable file", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn process_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut document: Option<UploadedDocument> = None;
    let mut user_id: Option<i64> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                document = Some(UploadedDocument {
                    file_name,
                    mime_type,
                    bytes,
                });
            }
            "user_id" => {
                let raw = field.text().await?;
                let parsed = raw.trim().parse().map_err(|_| {
                    Error::InvalidRequest(format!("user_id must be an integer, got '{}'", raw))
                })?;
                user_id = Some(parsed);
            }
            _ => {}
        }
    }

    let document = document
        .ok_or_else(|| Error::InvalidRequest("No spreadsheet provided in 'file' field".into()))?;
    let user_id =
        user_id.ok_or_else(|| Error::InvalidRequest("Missing 'user_id' field".into()))?;

    let processed = state
        .worker
        .process_document(&Requester::new(user_id), document)
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", processed.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        [
            (ROWS_TOTAL, processed.summary.total.to_string()),
            (ROWS_SUCCEEDED, processed.summary.succeeded.to_string()),
            (ROWS_FAILED, processed.summary.failed.to_string()),
        ],
        processed.bytes,
    )
        .into_response())
}
