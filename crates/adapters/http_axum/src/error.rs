//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use irrihub_domain::error::{ConfigurationRejected, IrrigationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

/// Maps [`IrrigationError`] and request validation failures to an HTTP
/// response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(IrrigationError),
    BadRequest(String),
}

impl From<IrrigationError> for ApiError {
    fn from(err: IrrigationError) -> Self {
        Self::Domain(err)
    }
}

impl From<ConfigurationRejected> for ApiError {
    fn from(err: ConfigurationRejected) -> Self {
        Self::Domain(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Domain(IrrigationError::ConfigurationRejected(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(IrrigationError::MalformedMessage(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(err @ IrrigationError::TransportUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            Self::Domain(err @ IrrigationError::Publish(_)) => {
                tracing::error!(error = ?err, "publish error");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            Self::Domain(err) => {
                tracing::error!(error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                ok: false,
                error: message,
            }),
        )
            .into_response()
    }
}
