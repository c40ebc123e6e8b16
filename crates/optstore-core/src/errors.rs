use optstore_core_types::RequestId;
use thiserror::Error;

use crate::model::TenantId;

/// Result type alias using OptionStoreError
pub type Result<T> = std::result::Result<T, OptionStoreError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every error raised by the store, the SQLite engine or the CLI maps onto
/// one of these kinds. The stable code of a kind is what callers and tests
/// match on; messages are for humans and may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Validation
    InvalidInput,

    // Identity
    /// Authenticated identity has no tenant capability
    UnsupportedIdentity,

    // Persistence
    ConstraintViolation,
    Persistence,
    Migration,
    Serialization,

    // Environment
    Io,
    Config,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::UnsupportedIdentity => "ERR_UNSUPPORTED_IDENTITY",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Migration => "ERR_MIGRATION",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus the addressing context of the failed call
/// (option key, tenant, request) so that a single log line is enough to
/// reproduce the call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    tenant_id: Option<TenantId>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            tenant_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(tenant_id) = self.tenant_id {
            write!(f, " (tenant_id: {})", tenant_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Errors raised by option store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionStoreError {
    /// The caller is authenticated but its identity cannot name a tenant,
    /// and no explicit tenant id was supplied
    #[error("Current identity '{user_id}' does not implement tenant capability")]
    UnsupportedIdentity { user_id: String },

    /// Option key is empty or exceeds the column width
    #[error("Invalid option key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Option value could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Failure reported by the persistence engine, passed through untouched
    #[error("{0}")]
    Engine(ExError),
}

impl OptionStoreError {
    /// Stable code of the canonical kind this error maps to
    pub fn code(&self) -> &'static str {
        match self {
            OptionStoreError::UnsupportedIdentity { .. } => ExErrorKind::UnsupportedIdentity.code(),
            OptionStoreError::InvalidKey { .. } => ExErrorKind::InvalidInput.code(),
            OptionStoreError::Serialization { .. } => ExErrorKind::Serialization.code(),
            OptionStoreError::Engine(err) => err.code(),
        }
    }
}

impl From<OptionStoreError> for ExError {
    fn from(err: OptionStoreError) -> Self {
        match err {
            OptionStoreError::UnsupportedIdentity { user_id } => {
                ExError::new(ExErrorKind::UnsupportedIdentity)
                    .with_op("resolve_tenant")
                    .with_message(format!(
                        "Identity '{}' does not implement tenant capability",
                        user_id
                    ))
            }
            OptionStoreError::InvalidKey { key, reason } => ExError::new(ExErrorKind::InvalidInput)
                .with_key(key)
                .with_message(reason),
            OptionStoreError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            OptionStoreError::Engine(err) => err,
        }
    }
}

impl From<ExError> for OptionStoreError {
    fn from(err: ExError) -> Self {
        OptionStoreError::Engine(err)
    }
}

impl From<serde_json::Error> for OptionStoreError {
    fn from(err: serde_json::Error) -> Self {
        OptionStoreError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_identity_code() {
        let err = OptionStoreError::UnsupportedIdentity {
            user_id: "u1".to_string(),
        };
        assert_eq!(err.code(), "ERR_UNSUPPORTED_IDENTITY");

        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::UnsupportedIdentity);
        assert!(ex.message().contains("u1"));
    }

    #[test]
    fn test_engine_error_passes_through_unchanged() {
        let engine_err = ExError::new(ExErrorKind::Persistence)
            .with_op("sqlite")
            .with_message("disk I/O error");
        let err: OptionStoreError = engine_err.clone().into();
        assert_eq!(err.code(), "ERR_PERSISTENCE");

        let back: ExError = err.into();
        assert_eq!(back, engine_err);
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::InvalidInput)
            .with_op("set")
            .with_key("site.name")
            .with_tenant_id(TenantId::new(7))
            .with_message("bad key");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_INVALID_INPUT] in operation 'set': bad key"));
        assert!(rendered.contains("(key: site.name)"));
        assert!(rendered.contains("(tenant_id: 7)"));
    }

    #[test]
    fn test_kind_codes_are_unique() {
        let kinds = [
            ExErrorKind::InvalidInput,
            ExErrorKind::UnsupportedIdentity,
            ExErrorKind::ConstraintViolation,
            ExErrorKind::Persistence,
            ExErrorKind::Migration,
            ExErrorKind::Serialization,
            ExErrorKind::Io,
            ExErrorKind::Config,
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), kinds.len());
    }
}
