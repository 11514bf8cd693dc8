//! Error responses.
//!
//! Every `RouterError` becomes a JSON body `{"error": <kind>, "detail": <message>}`
//! with the status below:
//!
//! ```text
//! NoHealthyBackend      503
//! NotFound              404
//! BadGateway            502
//! ServiceUnavailable    503
//! InvalidState          400
//! InvalidWindow         422
//! Stimulus              502 if the primary answered, 503 if it was unreachable
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{RouterError, UpstreamError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
}

impl RouterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RouterError::NoHealthyBackend | RouterError::ServiceUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            RouterError::NotFound => StatusCode::NOT_FOUND,
            RouterError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            RouterError::InvalidState(_) => StatusCode::BAD_REQUEST,
            RouterError::InvalidWindow(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RouterError::Stimulus { source: UpstreamError::Status(_), .. } => StatusCode::BAD_GATEWAY,
            RouterError::Stimulus { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind(),
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
