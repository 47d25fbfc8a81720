use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{debug, warn};

use sideline_common::SidelineError;

/// Handler error. Renders as `{"error": message}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub SidelineError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SidelineError::NotFound(_) => StatusCode::NOT_FOUND,
            SidelineError::Validation(_)
            | SidelineError::InvalidOption { .. }
            | SidelineError::SelfReference => StatusCode::BAD_REQUEST,
            SidelineError::DuplicateVote | SidelineError::Conflict(_) => StatusCode::CONFLICT,
            SidelineError::VotingClosed | SidelineError::Authorization(_) => StatusCode::FORBIDDEN,
            SidelineError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            SidelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SidelineError> for ApiError {
    fn from(e: SidelineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn every_error_maps_to_its_status() {
        let cases = [
            (SidelineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SidelineError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                SidelineError::InvalidOption {
                    question_id: Uuid::nil(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (SidelineError::SelfReference, StatusCode::BAD_REQUEST),
            (SidelineError::DuplicateVote, StatusCode::CONFLICT),
            (SidelineError::Conflict("x".into()), StatusCode::CONFLICT),
            (SidelineError::VotingClosed, StatusCode::FORBIDDEN),
            (SidelineError::Authorization("x".into()), StatusCode::FORBIDDEN),
            (SidelineError::Upstream("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (SidelineError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError(error.clone()).status(), status, "{error}");
        }
    }
}
