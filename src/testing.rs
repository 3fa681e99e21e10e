//! In-memory file store and renderer for tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::content::{ContentService, ContentSources, GalleryFailurePolicy};
use crate::drive::{DriveError, DriveFile, FileStore, ListQuery, DOCX_MIME, FOLDER_MIME};
use crate::render::{DocumentRenderer, RenderError, Rendered};
use crate::transform::{ImageUrlStrategy, TransformOptions};

pub const ROOT: &str = "root";
pub const NEWS: &str = "news";

/// Content the fake renderer refuses to convert
pub const BROKEN_DOCUMENT: &[u8] = b"BROKEN";

/// Build a file record created `minute` minutes after a fixed epoch
pub fn file(id: &str, name: &str, mime_type: &str, minute: u32) -> DriveFile {
    let t = Utc.with_ymd_and_hms(2024, 4, 1, 8, minute, 0).unwrap();
    DriveFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        created_time: t,
        modified_time: t,
        thumbnail_link: None,
        web_content_link: None,
    }
}

pub fn folder(id: &str, name: &str) -> DriveFile {
    file(id, name, FOLDER_MIME, 0)
}

pub fn image(id: &str, name: &str, minute: u32) -> DriveFile {
    let mut f = file(id, name, "image/jpeg", minute);
    f.thumbnail_link = Some(format!("https://lh3.test/{}=s220", id));
    f
}

pub fn document(id: &str, name: &str, minute: u32) -> DriveFile {
    file(id, name, DOCX_MIME, minute)
}

/// File store backed by maps, recording every call
#[derive(Default)]
pub struct MemoryStore {
    children: HashMap<String, Vec<DriveFile>>,
    contents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    listings: AtomicUsize,
    fetches: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children are returned in insertion order
    pub fn with_children(mut self, parent: &str, files: Vec<DriveFile>) -> Self {
        self.children.entry(parent.to_string()).or_default().extend(files);
        self
    }

    pub fn with_content(mut self, file_id: &str, bytes: &[u8]) -> Self {
        self.contents.insert(file_id.to_string(), bytes.to_vec());
        self
    }

    /// Listing this parent fails with a server error
    pub fn failing(mut self, parent: &str) -> Self {
        self.failing.insert(parent.to_string());
        self
    }

    /// Listing this parent takes `delay` to answer
    pub fn delayed(mut self, parent: &str, delay: Duration) -> Self {
        self.delays.insert(parent.to_string(), delay);
        self
    }

    pub fn listing_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list_files(&self, query: &ListQuery) -> Result<Vec<DriveFile>, DriveError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&query.parent_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&query.parent_id) {
            return Err(DriveError::Server(500, "backend error".to_string()));
        }
        Ok(self
            .children
            .get(&query.parent_id)
            .map(|files| {
                files
                    .iter()
                    .filter(|f| query.matches_mime(&f.mime_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_content(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        self.fetches.lock().unwrap().push(file_id.to_string());
        self.contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))
    }
}

/// Treats document bytes as ready-made HTML
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn render(&self, bytes: &[u8]) -> Result<Rendered, RenderError> {
        if bytes == BROKEN_DOCUMENT {
            return Err(RenderError::Unsupported("corrupt test document".to_string()));
        }
        Ok(Rendered {
            html: String::from_utf8_lossy(bytes).into_owned(),
            warnings: Vec::new(),
        })
    }
}

pub fn service(store: Arc<MemoryStore>, policy: GalleryFailurePolicy) -> ContentService {
    ContentService::new(
        store,
        Arc::new(HtmlRenderer),
        ContentSources {
            root_folder_id: ROOT.to_string(),
            news_folder_id: NEWS.to_string(),
        },
        TransformOptions {
            image_urls: ImageUrlStrategy::Thumbnail { size: 1200 },
            excerpt_length: 20,
        },
        policy,
    )
}
