use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::MessageBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid swap id.")]
    InvalidTaskId,

    #[error("Incorrect request. Provide source and target images in form-data format.")]
    MissingImage,

    #[error("Malformed upload: {0}")]
    BadUpload(String),

    #[error("Swap task not found.")]
    TaskNotFound,

    #[error("Server is overloaded, try again later.")]
    Overloaded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidTaskId => StatusCode::BAD_REQUEST,
            ApiError::MissingImage => StatusCode::BAD_REQUEST,
            ApiError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::TaskNotFound => StatusCode::NOT_FOUND,
            ApiError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = MessageBody {
            msg: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidTaskId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::TaskNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Overloaded.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
