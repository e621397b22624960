//! Document content extraction for inbound attachments.
//!
//! The kind is chosen from the filename suffix. PDFs are validated and passed to
//! the model as inline base64 data; zip archives yield the text of their first
//! `.txt` entry.

mod archive;
mod pdf;

pub use archive::first_text_entry;
pub use pdf::{encode_pdf, page_count};

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported document: {0}")]
    Unsupported(String),
    #[error("invalid pdf: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("pdf has no pages")]
    EmptyPdf,
    #[error("invalid zip archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
    #[error("no .txt file found in zip archive")]
    NoTextEntry,
    #[error("reading archive entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("text entry is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Zip,
}

impl DocumentKind {
    /// Pick the kind from a filename suffix (case-insensitive). None for anything else.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.trim().to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }

    /// Content types the download must declare for this kind.
    pub fn accepted_content_types(self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &[PDF_MIME],
            Self::Zip => &["application/zip", "application/x-zip-compressed"],
        }
    }
}

/// What the completion client receives for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Base64 (standard alphabet) of the original PDF bytes.
    InlinePdf { data: String },
    Text(String),
}

/// Run the extractor for `kind` over the downloaded bytes.
pub fn extract(kind: DocumentKind, bytes: &[u8]) -> Result<Extracted, ExtractError> {
    match kind {
        DocumentKind::Pdf => Ok(Extracted::InlinePdf {
            data: encode_pdf(bytes)?,
        }),
        DocumentKind::Zip => Ok(Extracted::Text(first_text_entry(bytes)?)),
    }
}
