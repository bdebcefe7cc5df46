use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use holdings_pipeline::HoldingsError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Holdings source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Holdings data rejected: {0}")]
    InvalidData(String),

    #[error("Invalid query: {0}")]
    BadQuery(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<HoldingsError> for ApiError {
    fn from(err: HoldingsError) -> Self {
        match err {
            HoldingsError::SourceUnavailable(msg) => ApiError::SourceUnavailable(msg),
            other => ApiError::InvalidData(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holdings_error_mapping() {
        let unavailable: ApiError = HoldingsError::SourceUnavailable("timeout".into()).into();
        assert_eq!(unavailable.into_response().status(), StatusCode::BAD_GATEWAY);

        let narrow: ApiError = HoldingsError::SchemaTooNarrow {
            found: 3,
            required: 10,
        }
        .into();
        assert_eq!(
            narrow.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
