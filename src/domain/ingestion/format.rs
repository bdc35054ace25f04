//! Accepted upload formats

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Binary document formats the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a file name. Extension matching is
    /// case-insensitive; anything other than `.pdf` or `.docx` is rejected
    /// before any bytes are touched.
    pub fn from_file_name(file_name: &str) -> Result<Self, DomainError> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("docx") => Ok(Self::Docx),
            Some(other) => Err(DomainError::unsupported_format(format!(
                "'.{other}' files are not supported, upload .pdf or .docx"
            ))),
            None => Err(DomainError::unsupported_format(format!(
                "'{file_name}' has no file extension, upload .pdf or .docx"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
