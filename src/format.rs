//! Document formats understood by the gateway.
//!
//! The set is closed: the external toolkit only ships converters for DOCX,
//! UDF, and PDF, so anything else is rejected at the boundary rather than
//! discovered as a missing route later. File extensions are the only format
//! signal the gateway has — uploads arrive as opaque bytes plus an original
//! filename, exactly like the upload collaborator hands them over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A document format the gateway can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Microsoft Word (Office Open XML).
    Docx,
    /// UYAP Document Format, the toolkit's native format.
    Udf,
    /// Portable Document Format. Accepted as an upload and produced as an
    /// output, but never converted *from* — the toolkit has no PDF reader.
    Pdf,
}

impl DocumentFormat {
    /// The canonical lowercase extension, without a leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Udf => "udf",
            DocumentFormat::Pdf => "pdf",
        }
    }

    /// Parse a format from an extension string (case-insensitive, with or
    /// without a leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "udf" => Some(DocumentFormat::Udf),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    /// Infer the format from a file path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// All formats, in the order the reference service advertised them.
    pub fn all() -> [DocumentFormat; 3] {
        [
            DocumentFormat::Docx,
            DocumentFormat::Pdf,
            DocumentFormat::Udf,
        ]
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = crate::error::GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| crate::error::GatewayError::UnsupportedExtension {
            extension: s.to_string(),
        })
    }
}
