use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use skirmish_core::core_match::MatchError;
use skirmish_core::core_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid session token")]
    InvalidSession,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Match error: {0}")]
    MatchError(#[from] MatchError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationFailed(_) | ApiError::InvalidSession => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MatchError(e) => match_status(e),
            ApiError::StoreError(e) => store_status(e),
            ApiError::Internal(_) | ApiError::IoError(_) | ApiError::JsonError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn match_status(err: &MatchError) -> StatusCode {
    match err {
        MatchError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        MatchError::NotFound => StatusCode::NOT_FOUND,
        MatchError::Forbidden => StatusCode::FORBIDDEN,
        MatchError::AlreadyInMatch
        | MatchError::AlreadyCreator
        | MatchError::MatchFull
        | MatchError::NotAMember
        | MatchError::NotInMatch
        | MatchError::NotATeammate
        | MatchError::CannotKickSelf => StatusCode::CONFLICT,
        MatchError::Store(e) => store_status(e),
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    if err.is_transient() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match err {
        StoreError::PlayerNotFound | StoreError::MatchNotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_errors_map_to_conflict() {
        for err in [
            MatchError::AlreadyInMatch,
            MatchError::MatchFull,
            MatchError::CannotKickSelf,
        ] {
            assert_eq!(ApiError::from(err).status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_status_mapping_covers_taxonomy() {
        assert_eq!(
            ApiError::from(MatchError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MatchError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(MatchError::InvalidArgument("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidSession.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(StoreError::Unavailable("pool".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
