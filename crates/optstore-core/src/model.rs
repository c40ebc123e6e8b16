//! Persisted option rows and the values they carry

use serde::{Deserialize, Serialize};

use crate::errors::{OptionStoreError, Result};

/// Maximum option key length in bytes (width of the `key` column)
pub const MAX_KEY_LEN: usize = 255;

/// Option payload. Anything JSON can express round-trips through the store.
pub type OptionValue = serde_json::Value;

/// Isolation scope an option belongs to
///
/// Every value, `0` included, names a real tenant. The global scope is
/// expressed by the absence of a tenant id, never by a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TenantId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

/// One row of the `options` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRow {
    /// Engine-assigned row id; increases with insertion order
    pub id: i64,
    pub key: String,
    pub value: OptionValue,
    /// `None` for global options
    pub tenant_id: Option<TenantId>,
}

impl OptionRow {
    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }
}

/// Reject keys the `options` table cannot hold
///
/// # Errors
///
/// Returns `InvalidKey` for an empty key or one longer than [`MAX_KEY_LEN`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(OptionStoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }
    if key.len() > MAX_KEY_LEN {
        return Err(OptionStoreError::InvalidKey {
            key: key.chars().take(32).collect(),
            reason: format!("key is {} bytes, limit is {}", key.len(), MAX_KEY_LEN),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_zero_is_a_tenant() {
        let zero = TenantId::new(0);
        assert_eq!(zero.get(), 0);
        assert_ne!(Some(zero), None);
    }

    #[test]
    fn test_tenant_id_parses_from_str() {
        assert_eq!("42".parse::<TenantId>().unwrap(), TenantId::new(42));
        assert_eq!(" -3 ".parse::<TenantId>().unwrap(), TenantId::new(-3));
        assert!("acme".parse::<TenantId>().is_err());
    }

    #[test]
    fn test_tenant_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&TenantId::new(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn test_validate_key_rejects_empty() {
        let err = validate_key("").unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_INPUT");
    }

    #[test]
    fn test_validate_key_limit() {
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN)).is_ok());
        assert!(validate_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }
}
