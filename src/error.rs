//! Service error taxonomy

use axum::http::StatusCode;

use crate::drive::DriveError;
use crate::render::RenderError;

/// Errors surfaced by the aggregation layer
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to list {what}: {source}")]
    UpstreamListing {
        what: String,
        #[source]
        source: DriveError,
    },

    #[error("Failed to fetch file {file_id}: {source}")]
    UpstreamFetch {
        file_id: String,
        #[source]
        source: DriveError,
    },

    #[error("Failed to convert document {file_id}: {source}")]
    Conversion {
        file_id: String,
        #[source]
        source: RenderError,
    },

    #[error("Article not found: {0}")]
    NotFound(String),
}

impl ProxyError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
