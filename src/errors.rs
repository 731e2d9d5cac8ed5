//! # Error Handling
//!
//! Structural input errors (a `page` or `rowsPerPage` that is not an integer)
//! fail [`PaginateOptionsBuilder::build`](crate::PaginateOptionsBuilder::build)
//! outright, while database errors from the count/materialize round-trips are
//! propagated unchanged. Per-value filter parse failures are deliberately
//! *not* errors; those degrade to always-false predicates during compilation.
//!
//! Internal database details are logged via `tracing` and never sent to
//! clients; the `IntoResponse` impl returns a sanitized JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Errors surfaced by the options builder and the query pipeline.
#[derive(Debug)]
pub enum PaginateError {
    /// 400 Bad Request - a reserved parameter failed to parse
    InvalidParameter {
        /// Parameter name (`page` or `rowsperpage`)
        name: &'static str,
        /// The raw value that failed to parse
        value: String,
    },

    /// 500 Internal Server Error - backend failure (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },
}

impl PaginateError {
    /// Create a 400 Bad Request error for an unparseable reserved parameter.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    /// Create a 500 Internal Server Error from a database error.
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Get the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized).
    fn user_message(&self) -> String {
        match self {
            Self::InvalidParameter { name, value } => {
                format!("Invalid value '{value}' for parameter '{name}': expected an integer")
            }
            Self::Database { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user).
    ///
    /// Uses the `tracing` crate - silent unless the caller set up a
    /// subscriber.
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::InvalidParameter { name, value } => {
                tracing::debug!(parameter = %name, value = %value, "Rejected query parameter");
            }
        }
    }
}

/// Error response sent to users (sanitized).
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for PaginateError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for PaginateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for PaginateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal, .. } => Some(internal),
            Self::InvalidParameter { .. } => None,
        }
    }
}

impl From<DbErr> for PaginateError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}
