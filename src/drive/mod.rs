//! Google Drive API client

pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;

pub use client::{DriveClient, DriveCredentials};
pub use errors::DriveError;
pub use types::*;

/// Read-only view of a hierarchical file store
///
/// The aggregation layer only talks to this trait, so it can run against
/// Drive in production and an in-memory store in tests.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List the direct children of `query.parent_id` matching the query
    async fn list_files(&self, query: &ListQuery) -> Result<Vec<DriveFile>, DriveError>;

    /// Fetch the raw bytes of a file
    async fn fetch_content(&self, file_id: &str) -> Result<Vec<u8>, DriveError>;
}
