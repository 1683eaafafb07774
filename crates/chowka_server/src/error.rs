//! Service-level errors and their HTTP mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chowka::RuleError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::db::{DbError, GameId};

/// Error returned by the game manager and the HTTP handlers.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ServiceError {
    /// The request broke a game rule; the game is unchanged.
    #[display("{}", _0)]
    Validation(RuleError),

    /// The request itself was malformed.
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),

    /// No game with this id exists.
    #[display("Game {} not found", _0)]
    NotFound(GameId),

    /// Storage failed; the game is unchanged.
    #[display("{}", _0)]
    Persistence(DbError),

    /// An invariant broke; the game cannot be trusted.
    #[display("Internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidRequest(_) => "invalid_request",
            Self::NotFound(_) => "not_found",
            Self::Persistence(_) => "persistence",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RuleError> for ServiceError {
    fn from(err: RuleError) -> Self {
        if err.is_fatal() {
            Self::Internal(err.to_string())
        } else {
            Self::Validation(err)
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        Self::Persistence(err)
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(err: JsonRejection) -> Self {
        Self::InvalidRequest(err.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(err: PathRejection) -> Self {
        Self::InvalidRequest(err.body_text())
    }
}

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Error class, see [`ServiceError::kind`].
    pub kind: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            warn!(kind = self.kind(), error = %self, "Request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
