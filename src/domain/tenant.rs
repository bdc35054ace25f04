//! Tenant identity

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Tenant identifier - the isolation unit for all stored knowledge.
///
/// Opaque non-empty string, max 128 characters. Every document, manual Q/A
/// pair and vector point carries exactly one tenant id; no operation crosses
/// tenant boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

const MAX_TENANT_ID_LEN: usize = 128;

impl TenantId {
    /// Create a new TenantId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("tenant id must not be empty"));
        }

        if trimmed.len() > MAX_TENANT_ID_LEN {
            return Err(DomainError::validation(format!(
                "tenant id exceeds {MAX_TENANT_ID_LEN} characters"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tenant_id() {
        let id = TenantId::new("acme-store-42").unwrap();
        assert_eq!(id.as_str(), "acme-store-42");
        assert_eq!(id.to_string(), "acme-store-42");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let id = TenantId::new("  acme  ").unwrap();
        assert_eq!(id.as_str(), "acme");
    }

    #[test]
    fn test_empty_tenant_id_rejected() {
        assert!(TenantId::new("").is_err());
        assert!(TenantId::new("   ").is_err());
    }

    #[test]
    fn test_oversized_tenant_id_rejected() {
        let long = "x".repeat(MAX_TENANT_ID_LEN + 1);
        assert!(TenantId::new(long).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = TenantId::new("acme").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"acme\"");

        let back: TenantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let result: Result<TenantId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
