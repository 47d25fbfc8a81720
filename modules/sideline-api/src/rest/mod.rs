pub mod challenge;
pub mod content;
pub mod profile;

use sideline_common::{ContentKind, SidelineError};

use crate::error::ApiError;

/// Path segment → content kind. Unknown kinds are simply not routes.
fn parse_kind(segment: &str) -> Result<ContentKind, ApiError> {
    segment
        .parse()
        .map_err(|_| ApiError(SidelineError::NotFound(format!("content kind {segment}"))))
}
