use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Failures that reach an HTTP client.
///
/// Aggregation and media-page listing failures never end up here; they are
/// logged where they happen and the page is served with whatever could be
/// assembled.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    /// Rendering the media page or a directory listing failed.
    #[error("template error: {0}")]
    Template(String),
    #[error("I/O error: {0}")]
    IoError(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Template(_) | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::IoError(_) => "IO_ERROR",
        }
    }

    /// Client-facing message plus optional details.
    fn public_parts(&self) -> (String, Option<Value>) {
        match self {
            AppError::NotFound(msg) => (msg.clone(), None),
            AppError::Template(msg) => {
                tracing::error!("template error: {}", msg);
                ("Failed to render page".to_string(), Some(json!({ "details": msg })))
            }
            AppError::IoError(msg) => {
                tracing::error!("I/O error: {}", msg);
                ("An I/O error occurred".to_string(), Some(json!({ "details": msg })))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = self.public_parts();

        let mut error = json!({ "code": self.code(), "message": message });
        if let Some(details) = details {
            error["details"] = details;
        }
        let body = json!({
            "error": error,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::IoError(format!("{}: {}", err.kind(), err)),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
