//! Response records served by the API
//!
//! Serialized with camelCase field names.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A gallery folder without its images
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
}

/// One displayable image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub thumbnail_link: Option<String>,
    /// Derived according to the configured image URL strategy
    pub image_url: String,
    pub download_url: Option<String>,
    pub created_time: DateTime<Utc>,
}

/// A folder with the images it contains, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryRecord {
    pub id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub image_count: usize,
    pub images: Vec<ImageRecord>,
}

impl GalleryRecord {
    pub fn new(folder: FolderRecord, images: Vec<ImageRecord>) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            created_time: folder.created_time,
            modified_time: folder.modified_time,
            image_count: images.len(),
            images,
        }
    }
}

/// Article as it appears in the news listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
}

/// Single article with its full HTML body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub warnings: Vec<String>,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
}
