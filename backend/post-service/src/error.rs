/// Error types for Post Service
///
/// Every failure a request can produce is an `AppError`. Each variant belongs
/// to a `MessageKind`, and `MessageKind` is the only place that decides which
/// HTTP status and body key a failure is rendered with.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// How an outcome is presented to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Malformed or out-of-range client input.
    Error,
    /// Missing credentials, or not permitted to touch the resource.
    Unauthorized,
    /// The request was understood; the answer is "nothing".
    Warning,
    /// The service itself failed.
    Failure,
}

impl MessageKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            MessageKind::Error => StatusCode::BAD_REQUEST,
            MessageKind::Unauthorized => StatusCode::UNAUTHORIZED,
            MessageKind::Warning => StatusCode::OK,
            MessageKind::Failure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body field the message is reported under.
    pub fn key(self) -> &'static str {
        match self {
            MessageKind::Warning => "warning",
            MessageKind::Error | MessageKind::Unauthorized | MessageKind::Failure => "error",
        }
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad enum value, non-integer id, wrong field type, missing parameter
    #[error("{0}")]
    Validation(String),

    /// Well-formed reference to something that does not exist
    #[error("{0}")]
    NotFound(String),

    /// Authenticated, but not an author of the post
    #[error("{0}")]
    Unauthorized(String),

    /// No valid current user
    #[error("{0}")]
    Unauthenticated(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> MessageKind {
        match self {
            AppError::Validation(_) => MessageKind::Error,
            AppError::NotFound(_) => MessageKind::Warning,
            AppError::Unauthorized(_) | AppError::Unauthenticated(_) => MessageKind::Unauthorized,
            AppError::Database(_) | AppError::Internal(_) => MessageKind::Failure,
        }
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        if kind == MessageKind::Failure {
            tracing::error!(error = %self, "request failed");
        }

        // Internal details stay in the logs.
        let message = match self {
            AppError::Database(_) | AppError::Internal(_) => {
                "Something went wrong while processing the request.".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(kind.status_code()).json(serde_json::json!({ kind.key(): message }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Eof | Category::Io => {
                AppError::Validation(format!("Request body is not valid JSON: {}", err))
            }
            Category::Data => {
                AppError::Validation(format!("Request body has a field of the wrong type: {}", err))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for `{}`", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}
