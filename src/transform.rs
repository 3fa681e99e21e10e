//! Record transforms
//!
//! Pure mappings from Drive file records to response records.

use std::fmt;
use std::str::FromStr;

use crate::drive::DriveFile;
use crate::models::{FolderRecord, ImageRecord};

/// Default maximum excerpt length in characters
pub const DEFAULT_EXCERPT_LENGTH: usize = 200;

/// Default edge size requested when rewriting thumbnail links
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 1600;

/// How `ImageRecord::image_url` is derived
///
/// `DirectView` links never expire but Drive may refuse to serve them to
/// third-party pages (hotlink protection). `Thumbnail` links are served by
/// the image CDN and resize on request, but rely on the undocumented `=s<N>`
/// suffix and expire after a few hours, so they are only safe behind the
/// cache's freshness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUrlStrategy {
    DirectView,
    Thumbnail { size: u32 },
}

impl Default for ImageUrlStrategy {
    fn default() -> Self {
        ImageUrlStrategy::Thumbnail {
            size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

impl FromStr for ImageUrlStrategy {
    type Err = String;

    /// Parses `direct` or `thumbnail`; the thumbnail size is set separately
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(ImageUrlStrategy::DirectView),
            "thumbnail" => Ok(ImageUrlStrategy::default()),
            other => Err(format!("unknown image URL strategy '{}'", other)),
        }
    }
}

impl fmt::Display for ImageUrlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageUrlStrategy::DirectView => f.write_str("direct"),
            ImageUrlStrategy::Thumbnail { size } => write!(f, "thumbnail (s{})", size),
        }
    }
}

impl ImageUrlStrategy {
    /// Derive the displayable URL for an image file
    pub fn image_url(&self, file: &DriveFile) -> String {
        match (self, file.thumbnail_link.as_deref()) {
            (ImageUrlStrategy::Thumbnail { size }, Some(link)) => resize_thumbnail(link, *size),
            _ => direct_view_url(&file.id),
        }
    }
}

/// Content-view URL for a file id
pub fn direct_view_url(file_id: &str) -> String {
    format!(
        "https://drive.google.com/uc?export=view&id={}",
        urlencoding::encode(file_id)
    )
}

/// Rewrite a trailing `=s<N>` size parameter; links without one are kept as-is
fn resize_thumbnail(link: &str, size: u32) -> String {
    match link.rfind("=s") {
        Some(pos) => {
            let digits = &link[pos + 2..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                format!("{}=s{}", &link[..pos], size)
            } else {
                link.to_string()
            }
        }
        None => link.to_string(),
    }
}

/// Settings shared by every transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub image_urls: ImageUrlStrategy,
    pub excerpt_length: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            image_urls: ImageUrlStrategy::default(),
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
        }
    }
}

pub fn folder_record(file: &DriveFile) -> FolderRecord {
    FolderRecord {
        id: file.id.clone(),
        name: file.name.clone(),
        created_time: file.created_time,
        modified_time: file.modified_time,
    }
}

pub fn image_record(file: &DriveFile, strategy: ImageUrlStrategy) -> ImageRecord {
    ImageRecord {
        id: file.id.clone(),
        name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        thumbnail_link: file.thumbnail_link.clone(),
        image_url: strategy.image_url(file),
        download_url: file.web_content_link.clone(),
        created_time: file.created_time,
    }
}

/// Strip a trailing `.doc`/`.docx` extension, ignoring case
pub fn article_title(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    for ext in [".docx", ".doc"] {
        if lower.ends_with(ext) {
            return file_name[..file_name.len() - ext.len()].to_string();
        }
    }
    file_name.to_string()
}

/// Remove every `<...>` span
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(end) => {
                text.push_str(&rest[..start]);
                rest = &rest[start + end + 1..];
            }
            None => break,
        }
    }
    text.push_str(rest);
    text
}

/// Plain-text excerpt of at most `max_chars` characters, with `...` appended
/// when the text had to be cut
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = strip_tags(html);
    let text = text.trim();

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
