//! Document rendering
//!
//! Converts word-processing documents into HTML fragments.

pub mod docx;

pub use docx::DocxRenderer;

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// HTML fragment (no surrounding document)
    pub html: String,
    /// Non-fatal conversion messages
    pub warnings: Vec<String>,
}

/// Document conversion errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Not a DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Archive has no word/document.xml")]
    MissingDocument,

    #[error("Failed to read document part: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unsupported document format: {0}")]
    Unsupported(String),
}

/// Converts raw document bytes into HTML
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, bytes: &[u8]) -> Result<Rendered, RenderError>;
}
