//! Resolved answer types

use serde::{Deserialize, Serialize};

/// Fallback answer returned when a tenant has no usable context
pub const NO_CONTEXT_FALLBACK: &str = "No relevant context found in the knowledge base.";

/// Which resolution stage produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// A curated manual Q/A pair matched the query
    ManualQa,
    /// Synthesized by the language model from retrieved document chunks
    Documents,
    /// Nothing retrievable for this tenant; fixed fallback answer
    None,
    /// A downstream failure was converted into a displayable message
    Error,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManualQa => "manual_qa",
            Self::Documents => "documents",
            Self::None => "none",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single flat result of answer resolution.
///
/// Resolution never fails outward: downstream errors are folded into an
/// `Error`-provenance answer so chat-facing callers always have a string to
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedAnswer {
    pub answer: String,
    pub provenance: Provenance,
}

impl ResolvedAnswer {
    pub fn manual_qa(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            provenance: Provenance::ManualQa,
        }
    }

    pub fn from_documents(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            provenance: Provenance::Documents,
        }
    }

    pub fn no_context() -> Self {
        Self {
            answer: NO_CONTEXT_FALLBACK.to_string(),
            provenance: Provenance::None,
        }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            answer: format!("Error: {}", message.into()),
            provenance: Provenance::Error,
        }
    }
}
