use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Reader failures the user can see. Range problems never end up here.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("no book selected")]
    NoBookSelected,

    #[error("content for book {0} not found")]
    ContentNotFound(u32),

    #[error("failed to load content: {0}")]
    LoadFailed(String),

    #[error("reading session not found")]
    SessionNotFound,
}

impl ReaderError {
    /// Heading and message shown in the reading area.
    pub fn user_message(&self) -> (&'static str, &'static str) {
        match self {
            ReaderError::NoBookSelected => (
                "No Book Selected",
                "Please go back to the library and choose a book to read.",
            ),
            ReaderError::ContentNotFound(_) => (
                "Content Not Found",
                "The reading content for this book could not be found.",
            ),
            ReaderError::LoadFailed(_) => (
                "Content Loading Error",
                "An error occurred while loading the book. Please try again.",
            ),
            ReaderError::SessionNotFound => (
                "Session Expired",
                "This reading session is no longer open. Please reopen the book.",
            ),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReaderError::NoBookSelected => StatusCode::BAD_REQUEST,
            ReaderError::ContentNotFound(_) => StatusCode::NOT_FOUND,
            ReaderError::LoadFailed(_) => StatusCode::BAD_GATEWAY,
            ReaderError::SessionNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ReaderError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, message) = self.user_message();
        if status.is_server_error() {
            tracing::error!("Reader error: {}", self);
        } else {
            tracing::debug!("Reader error: {}", self);
        }
        let body = json!({
            "error": error,
            "message": message,
            "detail": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(ReaderError::NoBookSelected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ReaderError::ContentNotFound(4).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ReaderError::LoadFailed("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ReaderError::ContentNotFound(4).user_message().0, "Content Not Found");
        assert_eq!(
            ReaderError::LoadFailed("timeout".into()).to_string(),
            "failed to load content: timeout"
        );
    }
}
