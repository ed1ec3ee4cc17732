use std::io::Cursor;

use serde::Serialize;
use thiserror::Error;
use tiny_http::Response;

use crate::routes::json_response;

/// Every failure a handler can report. `into_response` is the only place
/// errors become HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing required field or parameter.
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// Decode, transform, weight loading or storage failure.
    #[error("{message}: {cause}")]
    Processing { message: &'static str, cause: String },
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
    pub error: String,
}

impl ApiError {
    pub fn processing(message: &'static str, cause: impl std::fmt::Display) -> Self {
        ApiError::Processing { message, cause: cause.to_string() }
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Processing { .. } => 500,
        }
    }

    /// JSON envelope: `{message}` for client errors, `{message, error}` for
    /// processing failures.
    pub fn body(&self) -> serde_json::Value {
        let value = match self {
            ApiError::Processing { message, cause } => {
                serde_json::to_value(ErrorBody { message: *message, error: cause.clone() })
            }
            other => serde_json::to_value(MessageBody { message: other.to_string() }),
        };
        value.unwrap_or_default()
    }

    pub fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        json_response(self.status(), &self.body())
    }
}
