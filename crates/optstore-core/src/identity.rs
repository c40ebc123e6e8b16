//! Caller identity and tenant resolution
//!
//! The store never reads ambient authentication state. Whoever constructs an
//! [`OptionStore`](crate::OptionStore) hands it an [`IdentityProvider`]; the
//! store asks it for the current identity on every call and derives the
//! tenant scope from it.

use crate::errors::{OptionStoreError, Result};
use crate::model::TenantId;

/// Who is calling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No authenticated user (guest)
    Anonymous,
    /// Authenticated user without tenant capability
    Simple { user_id: String },
    /// Authenticated user bound to a tenant
    Tenanted { user_id: String, tenant_id: TenantId },
}

impl Identity {
    pub fn simple(user_id: impl Into<String>) -> Self {
        Identity::Simple {
            user_id: user_id.into(),
        }
    }

    pub fn tenanted(user_id: impl Into<String>, tenant_id: impl Into<TenantId>) -> Self {
        Identity::Tenanted {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Simple { user_id } | Identity::Tenanted { user_id, .. } => Some(user_id),
        }
    }

    /// Tenant capability of this identity
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedIdentity` for an authenticated identity that is not
    /// bound to a tenant. Guests have no tenant and yield `Ok(None)`.
    pub fn tenant_id(&self) -> Result<Option<TenantId>> {
        match self {
            Identity::Anonymous => Ok(None),
            Identity::Simple { user_id } => Err(OptionStoreError::UnsupportedIdentity {
                user_id: user_id.clone(),
            }),
            Identity::Tenanted { tenant_id, .. } => Ok(Some(*tenant_id)),
        }
    }
}

/// Source of the current caller's identity
///
/// Implementations must be side-effect free; the store calls
/// `current_identity` once per operation and does not cache the answer.
pub trait IdentityProvider {
    fn current_identity(&self) -> Identity;

    fn is_guest(&self) -> bool {
        self.current_identity().is_guest()
    }
}

/// A fixed identity is its own provider
impl IdentityProvider for Identity {
    fn current_identity(&self) -> Identity {
        self.clone()
    }

    fn is_guest(&self) -> bool {
        Identity::is_guest(self)
    }
}

impl<P: IdentityProvider + ?Sized> IdentityProvider for &P {
    fn current_identity(&self) -> Identity {
        (**self).current_identity()
    }

    fn is_guest(&self) -> bool {
        (**self).is_guest()
    }
}

/// Provider for processes that never authenticate (background jobs, CLI without --user)
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestProvider;

impl IdentityProvider for GuestProvider {
    fn current_identity(&self) -> Identity {
        Identity::Anonymous
    }

    fn is_guest(&self) -> bool {
        true
    }
}

/// Effective tenant id for one call
///
/// Precedence: explicit id, then the tenant of an authenticated identity,
/// then the global scope.
///
/// # Errors
///
/// Returns `UnsupportedIdentity` when no explicit id is given and the
/// authenticated identity has no tenant capability.
pub fn resolve_effective_tenant_id(
    provider: &dyn IdentityProvider,
    explicit: Option<TenantId>,
) -> Result<Option<TenantId>> {
    if let Some(tenant_id) = explicit {
        return Ok(Some(tenant_id));
    }
    if provider.is_guest() {
        return Ok(None);
    }
    provider.current_identity().tenant_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_tenant_wins() {
        let identity = Identity::tenanted("alice", 1);
        let resolved = resolve_effective_tenant_id(&identity, Some(TenantId::new(9))).unwrap();
        assert_eq!(resolved, Some(TenantId::new(9)));
    }

    #[test]
    fn test_explicit_tenant_bypasses_capability_check() {
        let identity = Identity::simple("bob");
        let resolved = resolve_effective_tenant_id(&identity, Some(TenantId::new(2))).unwrap();
        assert_eq!(resolved, Some(TenantId::new(2)));
    }

    #[test]
    fn test_tenanted_identity_resolves_its_tenant() {
        let identity = Identity::tenanted("alice", 3);
        let resolved = resolve_effective_tenant_id(&identity, None).unwrap();
        assert_eq!(resolved, Some(TenantId::new(3)));
    }

    #[test]
    fn test_simple_identity_without_explicit_tenant_fails() {
        let identity = Identity::simple("bob");
        let err = resolve_effective_tenant_id(&identity, None).unwrap_err();
        assert_eq!(
            err,
            OptionStoreError::UnsupportedIdentity {
                user_id: "bob".to_string()
            }
        );
    }

    #[test]
    fn test_guest_resolves_to_global_scope() {
        assert_eq!(resolve_effective_tenant_id(&GuestProvider, None).unwrap(), None);
        assert_eq!(
            resolve_effective_tenant_id(&Identity::Anonymous, None).unwrap(),
            None
        );
    }

    #[test]
    fn test_user_id_accessor() {
        assert_eq!(Identity::Anonymous.user_id(), None);
        assert_eq!(Identity::simple("bob").user_id(), Some("bob"));
    }
}
