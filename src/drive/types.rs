//! Drive API types and listing queries
//!
//! Defines the file records returned by `files.list` and the query builder
//! used to express child listings (parent, MIME filter, trashed flag, order).

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// MIME type Drive uses for folders
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME type of Office Open XML word-processing documents
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of legacy binary Word documents
pub const DOC_MIME: &str = "application/msword";

/// Field projection for folder listings
pub const FOLDER_FIELDS: &str = "files(id, name, mimeType, createdTime, modifiedTime)";

/// Field projection for image listings
pub const IMAGE_FIELDS: &str =
    "files(id, name, mimeType, thumbnailLink, webContentLink, createdTime, modifiedTime)";

/// Field projection for document listings
pub const DOCUMENT_FIELDS: &str = "files(id, name, mimeType, createdTime, modifiedTime)";

/// Drive has no unpaginated listing; one page of this size is requested
pub const PAGE_SIZE: u32 = 1000;

/// Drive file/folder record from API responses
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// Opaque file ID
    pub id: String,
    /// Display name, including any extension
    pub name: String,
    /// MIME type ("application/vnd.google-apps.folder" for folders)
    pub mime_type: String,
    /// Creation time (RFC 3339)
    pub created_time: DateTime<Utc>,
    /// Last modification time (RFC 3339)
    pub modified_time: DateTime<Utc>,
    /// Short-lived thumbnail URL, only present for files with previews
    #[serde(default)]
    pub thumbnail_link: Option<String>,
    /// Direct download link, absent for folders
    #[serde(default)]
    pub web_content_link: Option<String>,
}

/// Response from the files.list API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

/// A single MIME predicate inside a listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeFilter {
    /// `mimeType = '<value>'`
    Equals(&'static str),
    /// `mimeType contains '<value>'`
    Contains(&'static str),
}

impl MimeFilter {
    fn clause(&self) -> String {
        match self {
            MimeFilter::Equals(m) => format!("mimeType = '{}'", m),
            MimeFilter::Contains(m) => format!("mimeType contains '{}'", m),
        }
    }
}

/// Ordering requested from files.list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NameAscending,
    CreatedDescending,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::NameAscending => "name",
            SortOrder::CreatedDescending => "createdTime desc",
        }
    }
}

/// Child listing query: files directly under `parent_id` matching any of
/// `mime_filters`, excluding trashed entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub parent_id: String,
    pub mime_filters: Vec<MimeFilter>,
    pub order: SortOrder,
    pub fields: &'static str,
}

impl ListQuery {
    /// Sub-folders of `parent_id`, by name
    pub fn folders(parent_id: &str) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            mime_filters: vec![MimeFilter::Equals(FOLDER_MIME)],
            order: SortOrder::NameAscending,
            fields: FOLDER_FIELDS,
        }
    }

    /// Image files in `parent_id`, newest first
    pub fn images(parent_id: &str) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            mime_filters: vec![MimeFilter::Contains("image/")],
            order: SortOrder::CreatedDescending,
            fields: IMAGE_FIELDS,
        }
    }

    /// Word-processing documents in `parent_id`, newest first
    pub fn documents(parent_id: &str) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            mime_filters: vec![MimeFilter::Equals(DOCX_MIME), MimeFilter::Equals(DOC_MIME)],
            order: SortOrder::CreatedDescending,
            fields: DOCUMENT_FIELDS,
        }
    }

    /// Render the Drive `q` search expression
    pub fn to_q(&self) -> String {
        let parent = escape_literal(&self.parent_id);
        let mime = match self.mime_filters.as_slice() {
            [] => None,
            [single] => Some(single.clause()),
            many => Some(format!(
                "({})",
                many.iter().map(MimeFilter::clause).collect::<Vec<_>>().join(" or ")
            )),
        };

        match mime {
            Some(mime) => format!("'{}' in parents and {} and trashed = false", parent, mime),
            None => format!("'{}' in parents and trashed = false", parent),
        }
    }

    /// Check whether a record satisfies the MIME part of this query
    pub fn matches_mime(&self, mime_type: &str) -> bool {
        self.mime_filters.iter().any(|f| match f {
            MimeFilter::Equals(m) => mime_type == *m,
            MimeFilter::Contains(m) => mime_type.contains(m),
        })
    }
}

/// Escape a string literal for a Drive query expression
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_image_file() {
        let json = r#"{
            "id": "1AbC",
            "name": "sunset.jpg",
            "mimeType": "image/jpeg",
            "thumbnailLink": "https://lh3.googleusercontent.com/abc=s220",
            "webContentLink": "https://drive.google.com/uc?id=1AbC&export=download",
            "createdTime": "2024-03-01T10:15:00.000Z",
            "modifiedTime": "2024-03-02T08:00:00.000Z"
        }"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "1AbC");
        assert_eq!(file.name, "sunset.jpg");
        assert_ne!(file.mime_type, FOLDER_MIME);
        assert_eq!(
            file.thumbnail_link.as_deref(),
            Some("https://lh3.googleusercontent.com/abc=s220")
        );
        assert_eq!(file.created_time.to_rfc3339(), "2024-03-01T10:15:00+00:00");
    }

    #[test]
    fn test_deserialize_folder_list() {
        // Folders come back without thumbnail or content links
        let json = r#"{
            "files": [
                {
                    "id": "f1",
                    "name": "Autumn",
                    "mimeType": "application/vnd.google-apps.folder",
                    "createdTime": "2023-10-01T00:00:00Z",
                    "modifiedTime": "2023-10-05T00:00:00Z"
                }
            ]
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 1);
        assert_eq!(list.files[0].mime_type, FOLDER_MIME);
        assert_eq!(list.files[0].thumbnail_link, None);
        assert_eq!(list.files[0].web_content_link, None);
    }

    #[test]
    fn test_deserialize_empty_list() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }

    #[test]
    fn test_folder_query() {
        let q = ListQuery::folders("root123").to_q();
        assert_eq!(
            q,
            "'root123' in parents and mimeType = 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_document_query_ors_mime_types() {
        let query = ListQuery::documents("news");
        let q = query.to_q();
        assert!(q.starts_with("'news' in parents and ("));
        assert!(q.contains(&format!("mimeType = '{}' or mimeType = '{}'", DOCX_MIME, DOC_MIME)));
        assert!(q.ends_with("and trashed = false"));
        assert_eq!(query.order.as_param(), "createdTime desc");
    }

    #[test]
    fn test_query_escapes_parent() {
        let q = ListQuery::images("it's").to_q();
        assert!(q.starts_with(r"'it\'s' in parents"));
        assert!(q.contains("mimeType contains 'image/'"));
    }

    #[test]
    fn test_matches_mime() {
        assert!(ListQuery::images("x").matches_mime("image/png"));
        assert!(!ListQuery::images("x").matches_mime("application/pdf"));
        assert!(ListQuery::documents("x").matches_mime(DOC_MIME));
        assert!(!ListQuery::folders("x").matches_mime("image/png"));
    }
}
