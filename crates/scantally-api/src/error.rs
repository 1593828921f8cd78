use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scantally_core::protocol::ErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad payload")]
    BadPayload,
    #[error("server_error: {0}")]
    Server(String),
}

impl From<scantally_core::Error> for AppError {
    fn from(error: scantally_core::Error) -> Self {
        Self::Server(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadPayload => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "bad payload".to_string(),
                    detail: None,
                },
            ),
            Self::Server(detail) => {
                tracing::error!("Request failed: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "server_error".to_string(),
                        detail: Some(detail),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
