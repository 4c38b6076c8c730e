use crate::db::errors::DbError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error as ThisError;
use utoipa::ToSchema;

/// External service a request depended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    OpenAi,
    Gemini,
    YouTube,
}

impl Upstream {
    fn code(self) -> &'static str {
        match self {
            Upstream::OpenAi => "OPENAI_API_ERROR",
            Upstream::Gemini => "GEMINI_API_ERROR",
            Upstream::YouTube => "YOUTUBE_API_ERROR",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Upstream::OpenAi => "OpenAI",
            Upstream::Gemini => "Gemini",
            Upstream::YouTube => "YouTube",
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// A video URL that doesn't match any known YouTube URL shape
    #[error("Invalid YouTube URL: {url}")]
    InvalidVideoUrl { url: String },

    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Registered user lacks credits for the requested operation
    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i32, available: i32 },

    /// Guest exhausted the anonymous trial allowance
    #[error("Free trial exhausted for {ip}")]
    TrialExhausted { ip: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// An external API call failed and there is no fallback for it
    #[error("{} request failed: {message}", .service.label())]
    Upstream { service: Upstream, message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// User-facing error message
    pub error: String,
    /// Machine-readable error code, e.g. `INSUFFICIENT_CREDITS`
    pub code: String,
    /// Optional extra detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Page the client should navigate to, for quota errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::InvalidVideoUrl { .. } => StatusCode::BAD_REQUEST,
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InsufficientCredits { .. } | Error::TrialExhausted { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { .. } | Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable code surfaced to clients
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest { .. } => "INVALID_INPUT",
            Error::InvalidVideoUrl { .. } => "INVALID_VIDEO_URL",
            Error::Unauthenticated { .. } => "UNAUTHORIZED",
            Error::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            Error::TrialExhausted { .. } => "TRIAL_EXHAUSTED",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Upstream { service, .. } => service.code(),
            Error::Database(DbError::NotFound) => "NOT_FOUND",
            Error::Database(DbError::UniqueViolation { .. }) => "CONFLICT",
            Error::Database(DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. }) => "INVALID_INPUT",
            Error::Internal { .. } | Error::Database(DbError::Other(_)) | Error::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::InvalidVideoUrl { .. } => "The URL is not a valid YouTube video URL".to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InsufficientCredits { .. } => "Not enough credits".to_string(),
            Error::TrialExhausted { .. } => "The free trial has been used up. Sign up to keep generating.".to_string(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Upstream { service, .. } => format!("{} request failed", service.label()),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Error::InsufficientCredits { required, available } => {
                Some(format!("This request needs {required} credits, {available} available"))
            }
            Error::InvalidVideoUrl { url } => Some(format!("Could not find a video id in '{url}'")),
            _ => None,
        }
    }

    fn redirect(&self) -> Option<String> {
        match self {
            Error::TrialExhausted { .. } => Some("/signup".to_string()),
            Error::InsufficientCredits { .. } => Some("/pricing".to_string()),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.user_message(),
            code: self.code().to_string(),
            message: self.detail(),
            redirect: self.redirect(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { .. } => {
                tracing::error!("Upstream service error: {}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InsufficientCredits { .. } | Error::TrialExhausted { .. } => {
                tracing::info!("Access denied: {}", self);
            }
            Error::BadRequest { .. } | Error::InvalidVideoUrl { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), axum::response::Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest {
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest {
            message: format!("Invalid query parameters: {}", rejection.body_text()),
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest {
            message: format!("Invalid path: {}", rejection.body_text()),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_errors_carry_redirects() {
        let trial = Error::TrialExhausted { ip: "1.2.3.4".to_string() };
        assert_eq!(trial.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(trial.body().redirect.as_deref(), Some("/signup"));

        let credits = Error::InsufficientCredits { required: 4, available: 1 };
        assert_eq!(credits.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(credits.code(), "INSUFFICIENT_CREDITS");
        assert_eq!(credits.body().redirect.as_deref(), Some("/pricing"));
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = Error::Other(anyhow::anyhow!("connection refused to 10.0.0.3:5432"));
        let body = err.body();
        assert_eq!(body.error, "Internal server error");
        assert!(body.message.is_none());
        assert!(!body.success);
    }

    #[test]
    fn test_upstream_codes() {
        let err = Error::Upstream {
            service: Upstream::YouTube,
            message: "quotaExceeded".to_string(),
        };
        assert_eq!(err.code(), "YOUTUBE_API_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("quotaExceeded"));
    }

    #[test]
    fn test_every_upstream_has_a_service_code() {
        for (service, code, label) in [
            (Upstream::OpenAi, "OPENAI_API_ERROR", "OpenAI"),
            (Upstream::Gemini, "GEMINI_API_ERROR", "Gemini"),
            (Upstream::YouTube, "YOUTUBE_API_ERROR", "YouTube"),
        ] {
            let err = Error::Upstream {
                service,
                message: "boom".to_string(),
            };
            assert_eq!(err.code(), code);
            assert!(err.user_message().contains(label));
        }
    }
}
