//! Gallery and news aggregation
//!
//! Lists top-level entries from the file store, fans out one lookup per
//! entry and joins the results in listing order.

pub mod galleries;
pub mod news;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::drive::FileStore;
use crate::render::DocumentRenderer;
use crate::transform::TransformOptions;

/// What to do when one folder's image listing fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GalleryFailurePolicy {
    /// Log the failure and leave that gallery out
    #[default]
    Skip,
    /// Fail the whole gallery aggregation
    Strict,
}

impl FromStr for GalleryFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(GalleryFailurePolicy::Skip),
            "strict" => Ok(GalleryFailurePolicy::Strict),
            other => Err(format!("unknown gallery failure policy '{}'", other)),
        }
    }
}

impl fmt::Display for GalleryFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GalleryFailurePolicy::Skip => f.write_str("skip"),
            GalleryFailurePolicy::Strict => f.write_str("strict"),
        }
    }
}

/// Folder ids the service reads from
#[derive(Debug, Clone)]
pub struct ContentSources {
    pub root_folder_id: String,
    pub news_folder_id: String,
}

/// Read-through aggregation over a file store
pub struct ContentService {
    store: Arc<dyn FileStore>,
    renderer: Arc<dyn DocumentRenderer>,
    sources: ContentSources,
    options: TransformOptions,
    gallery_failures: GalleryFailurePolicy,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn FileStore>,
        renderer: Arc<dyn DocumentRenderer>,
        sources: ContentSources,
        options: TransformOptions,
        gallery_failures: GalleryFailurePolicy,
    ) -> Self {
        Self {
            store,
            renderer,
            sources,
            options,
            gallery_failures,
        }
    }
}
