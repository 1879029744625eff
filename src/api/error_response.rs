//! HTTP error response handling for the API
//!
//! Domain errors become JSON [`ApiError`] bodies with the status code from
//! [`ToHttpStatus`].

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let api_error: ApiError = self.into();
        (status_code, Json(api_error)).into_response()
    }
}

impl From<MultipartError> for Error {
    fn from(error: MultipartError) -> Self {
        Error::InvalidRequest(format!("malformed multipart body: {}", error))
    }
}
