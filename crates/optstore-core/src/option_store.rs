//! Tenant-scoped option store
//!
//! Every operation resolves an effective tenant id first:
//!
//! 1. an explicit tenant id passed by the caller,
//! 2. otherwise the tenant of the authenticated identity,
//! 3. otherwise nothing, which addresses the global scope.
//!
//! The resolved id becomes an equality filter on `(key[, tenant_id])`
//! and the engine does the rest.
//!
//! ## Logging Ownership
//!
//! Public operations emit `start` / `end` / `end_error` events. Option
//! values are never logged.

use std::time::Instant;

use optstore_core_types::schema::{
    FIELD_ENTRY_COUNT, FIELD_OPTION_KEY, FIELD_REQUEST_ID, FIELD_ROWS_DELETED, FIELD_SCOPE,
    FIELD_TENANT_ID, SCOPE_GLOBAL, SCOPE_TENANT,
};
use optstore_core_types::RequestContext;
use serde::de::DeserializeOwned;

use crate::engine::PersistenceEngine;
use crate::errors::{OptionStoreError, Result};
use crate::filter::{Filter, SetValues};
use crate::identity::{resolve_effective_tenant_id, Identity, IdentityProvider};
use crate::model::{validate_key, OptionValue, TenantId};
use crate::{log_op_end, log_op_error, log_op_start};

const OP_EXISTS: &str = "option_exists";
const OP_GET: &str = "option_get";
const OP_SET: &str = "option_set";
const OP_SET_MANY: &str = "option_set_many";
const OP_REMOVE: &str = "option_remove";

/// Key/value option store over a persistence engine
///
/// Reads take `&self`, writes take `&mut self`. The identity provider is
/// consulted on every call; construct one store per request, or swap the
/// provider with [`OptionStore::with_identity`].
///
/// ```
/// use optstore_core::{Identity, MemoryEngine, OptionStore, TenantId};
/// use serde_json::json;
///
/// let mut store = OptionStore::new(MemoryEngine::new(), Identity::tenanted("alice", 5));
/// store.set("theme", json!("dark"), None).unwrap();
///
/// assert_eq!(store.get("theme", None, None).unwrap(), Some(json!("dark")));
/// assert_eq!(store.get("theme", None, Some(TenantId::new(9))).unwrap(), None);
/// ```
#[derive(Debug)]
pub struct OptionStore<E, P = Identity> {
    engine: E,
    identity: P,
    context: Option<RequestContext>,
}

impl<E, P> OptionStore<E, P>
where
    E: PersistenceEngine,
    P: IdentityProvider,
{
    pub fn new(engine: E, identity: P) -> Self {
        Self {
            engine,
            identity,
            context: None,
        }
    }

    /// Tag this store's log events with a request id
    pub fn with_request_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Same engine, different caller
    pub fn with_identity<Q: IdentityProvider>(self, identity: Q) -> OptionStore<E, Q> {
        OptionStore {
            engine: self.engine,
            identity,
            context: self.context,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// True when an authenticated (non-guest) identity is present
    pub fn is_multi_tenant(&self) -> bool {
        !self.identity.is_guest()
    }

    /// See [`resolve_effective_tenant_id`]
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedIdentity` when no explicit id is given and the
    /// authenticated identity has no tenant capability.
    pub fn resolve_effective_tenant_id(&self, explicit: Option<TenantId>) -> Result<Option<TenantId>> {
        resolve_effective_tenant_id(&self.identity, explicit)
    }

    /// Filter addressing `key` in the given scope
    pub fn build_filter(key: &str, tenant_id: Option<TenantId>) -> Filter {
        Filter::new(key, tenant_id)
    }

    /// Whether an option exists in the effective scope
    ///
    /// # Errors
    ///
    /// `InvalidKey`, `UnsupportedIdentity`, or an engine failure.
    pub fn exists(&self, key: &str, tenant_id: Option<TenantId>) -> Result<bool> {
        log_op_start!(
            OP_EXISTS,
            { FIELD_OPTION_KEY } = key,
            { FIELD_REQUEST_ID } = self.request_id()
        );
        let start = Instant::now();

        let exists = self
            .exists_impl(key, tenant_id)
            .map_err(|e| self.fail(OP_EXISTS, key, tenant_id, e, start))?;

        log_op_end!(
            OP_EXISTS,
            duration_ms = elapsed_ms(start),
            { FIELD_OPTION_KEY } = key,
            exists = exists
        );
        Ok(exists)
    }

    fn exists_impl(&self, key: &str, tenant_id: Option<TenantId>) -> Result<bool> {
        let filter = self.scoped_filter(key, tenant_id)?;
        Ok(self.engine.exists(&filter)?)
    }

    /// Value of an option, or `default` when no row matches
    ///
    /// # Errors
    ///
    /// `InvalidKey`, `UnsupportedIdentity`, or an engine failure. A missing
    /// option is not an error.
    pub fn get(
        &self,
        key: &str,
        default: Option<OptionValue>,
        tenant_id: Option<TenantId>,
    ) -> Result<Option<OptionValue>> {
        log_op_start!(
            OP_GET,
            { FIELD_OPTION_KEY } = key,
            { FIELD_REQUEST_ID } = self.request_id()
        );
        let start = Instant::now();

        let found = self
            .get_impl(key, tenant_id)
            .map_err(|e| self.fail(OP_GET, key, tenant_id, e, start))?;

        log_op_end!(
            OP_GET,
            duration_ms = elapsed_ms(start),
            { FIELD_OPTION_KEY } = key,
            found = found.is_some()
        );
        Ok(found.or(default))
    }

    fn get_impl(&self, key: &str, tenant_id: Option<TenantId>) -> Result<Option<OptionValue>> {
        let filter = self.scoped_filter(key, tenant_id)?;
        Ok(self.engine.find_one(&filter)?.map(|row| row.value))
    }

    /// Typed read: deserialize the stored value into `T`
    ///
    /// # Errors
    ///
    /// Everything [`OptionStore::get`] can return, plus `Serialization` when
    /// the stored value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, tenant_id: Option<TenantId>) -> Result<Option<T>> {
        self.get(key, None, tenant_id)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(OptionStoreError::from)
    }

    /// Create or overwrite one option in the effective scope
    ///
    /// # Errors
    ///
    /// `InvalidKey`, `UnsupportedIdentity`, or an engine failure.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<OptionValue>,
        tenant_id: Option<TenantId>,
    ) -> Result<()> {
        log_op_start!(
            OP_SET,
            { FIELD_OPTION_KEY } = key,
            { FIELD_REQUEST_ID } = self.request_id()
        );
        let start = Instant::now();

        let entries = vec![(key.to_string(), value.into())];
        let scope = self
            .set_impl(entries, tenant_id)
            .map_err(|e| self.fail(OP_SET, key, tenant_id, e, start))?;

        log_op_end!(
            OP_SET,
            duration_ms = elapsed_ms(start),
            { FIELD_OPTION_KEY } = key,
            { FIELD_SCOPE } = scope_label(scope),
            { FIELD_TENANT_ID } = scope.map(TenantId::get)
        );
        Ok(())
    }

    /// Create or overwrite several options in one effective scope
    ///
    /// The tenant is resolved once and applies to every entry. Keys are
    /// validated before the first write. Each upsert is independent; a
    /// failing engine can leave earlier entries written.
    ///
    /// # Errors
    ///
    /// `InvalidKey`, `UnsupportedIdentity`, or an engine failure.
    pub fn set_many<I, K, V>(&mut self, entries: I, tenant_id: Option<TenantId>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionValue>,
    {
        let entries: Vec<(String, OptionValue)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        log_op_start!(
            OP_SET_MANY,
            { FIELD_ENTRY_COUNT } = entries.len(),
            { FIELD_REQUEST_ID } = self.request_id()
        );
        let start = Instant::now();

        let count = entries.len();
        let scope = self.set_impl(entries, tenant_id).map_err(|e| {
            let e = self.with_call_context(e, tenant_id);
            log_op_error!(
                OP_SET_MANY,
                e.clone(),
                duration_ms = elapsed_ms(start),
                { FIELD_ENTRY_COUNT } = count,
                { FIELD_REQUEST_ID } = self.request_id()
            );
            e
        })?;

        log_op_end!(
            OP_SET_MANY,
            duration_ms = elapsed_ms(start),
            { FIELD_ENTRY_COUNT } = count,
            { FIELD_SCOPE } = scope_label(scope),
            { FIELD_TENANT_ID } = scope.map(TenantId::get)
        );
        Ok(())
    }

    fn set_impl(
        &mut self,
        entries: Vec<(String, OptionValue)>,
        tenant_id: Option<TenantId>,
    ) -> Result<Option<TenantId>> {
        for (key, _) in &entries {
            validate_key(key)?;
        }
        let scope = self.resolve_effective_tenant_id(tenant_id)?;

        for (key, value) in entries {
            let filter = Filter::new(key, scope);
            let values = SetValues::new(value, scope);
            tracing::debug!(
                { FIELD_OPTION_KEY } = filter.key.as_str(),
                { FIELD_SCOPE } = scope_label(scope),
                "upsert"
            );
            self.engine.upsert(&filter, &values)?;
        }
        Ok(scope)
    }

    /// Delete an option from the effective scope
    ///
    /// Returns true iff at least one row was deleted. With a global scope
    /// the filter is key-only and removes the key from every tenant.
    ///
    /// # Errors
    ///
    /// `InvalidKey`, `UnsupportedIdentity`, or an engine failure.
    pub fn remove(&mut self, key: &str, tenant_id: Option<TenantId>) -> Result<bool> {
        log_op_start!(
            OP_REMOVE,
            { FIELD_OPTION_KEY } = key,
            { FIELD_REQUEST_ID } = self.request_id()
        );
        let start = Instant::now();

        let deleted = self
            .remove_impl(key, tenant_id)
            .map_err(|e| self.fail(OP_REMOVE, key, tenant_id, e, start))?;

        log_op_end!(
            OP_REMOVE,
            duration_ms = elapsed_ms(start),
            { FIELD_OPTION_KEY } = key,
            { FIELD_ROWS_DELETED } = deleted
        );
        Ok(deleted > 0)
    }

    fn remove_impl(&mut self, key: &str, tenant_id: Option<TenantId>) -> Result<usize> {
        let filter = self.scoped_filter(key, tenant_id)?;
        Ok(self.engine.delete_all(&filter)?)
    }

    fn scoped_filter(&self, key: &str, tenant_id: Option<TenantId>) -> Result<Filter> {
        validate_key(key)?;
        let scope = self.resolve_effective_tenant_id(tenant_id)?;
        Ok(Self::build_filter(key, scope))
    }

    fn request_id(&self) -> Option<&str> {
        self.context.as_ref().map(|ctx| ctx.request_id.as_str())
    }

    fn fail(
        &self,
        op: &str,
        key: &str,
        tenant_id: Option<TenantId>,
        err: OptionStoreError,
        start: Instant,
    ) -> OptionStoreError {
        let err = self.with_call_context(err, tenant_id);
        log_op_error!(
            op,
            err.clone(),
            duration_ms = elapsed_ms(start),
            { FIELD_OPTION_KEY } = key,
            { FIELD_REQUEST_ID } = self.request_id()
        );
        err
    }

    /// Stamp engine failures with the request id and the effective tenant
    fn with_call_context(
        &self,
        err: OptionStoreError,
        tenant_id: Option<TenantId>,
    ) -> OptionStoreError {
        let OptionStoreError::Engine(mut ex) = err else {
            return err;
        };
        if let Some(ctx) = &self.context {
            ex = ex.with_request_id(ctx.request_id.clone());
        }
        if let Ok(Some(scope)) = self.resolve_effective_tenant_id(tenant_id) {
            ex = ex.with_tenant_id(scope);
        }
        OptionStoreError::Engine(ex)
    }
}

fn scope_label(tenant_id: Option<TenantId>) -> &'static str {
    if tenant_id.is_some() {
        SCOPE_TENANT
    } else {
        SCOPE_GLOBAL
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineResult, MemoryEngine};
    use crate::errors::{ExError, ExErrorKind};
    use crate::identity::GuestProvider;
    use crate::model::OptionRow;
    use optstore_core_types::RequestId;
    use serde_json::json;

    /// Engine whose every call fails like a lost database
    struct BrokenEngine;

    fn broken() -> ExError {
        ExError::new(ExErrorKind::Persistence).with_message("database is gone")
    }

    impl PersistenceEngine for BrokenEngine {
        fn exists(&self, _filter: &Filter) -> EngineResult<bool> {
            Err(broken())
        }

        fn find_one(&self, _filter: &Filter) -> EngineResult<Option<OptionRow>> {
            Err(broken())
        }

        fn upsert(&mut self, _filter: &Filter, _values: &SetValues) -> EngineResult<()> {
            Err(broken())
        }

        fn delete_all(&mut self, _filter: &Filter) -> EngineResult<usize> {
            Err(broken())
        }
    }

    fn engine_error(err: OptionStoreError) -> ExError {
        match err {
            OptionStoreError::Engine(ex) => ex,
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_failures_carry_request_and_tenant() {
        let ctx = RequestContext::with_request_id(RequestId::from_string("req-42".to_string()));
        let mut store =
            OptionStore::new(BrokenEngine, Identity::tenanted("alice", 3)).with_request_context(ctx);

        let ex = engine_error(store.get("theme", None, None).unwrap_err());
        assert_eq!(ex.code(), "ERR_PERSISTENCE");
        assert_eq!(ex.request_id().map(RequestId::as_str), Some("req-42"));
        assert_eq!(ex.tenant_id(), Some(TenantId::new(3)));
        assert!(ex.message().contains("database is gone"));

        let ex = engine_error(store.set("theme", json!(1), Some(TenantId::new(9))).unwrap_err());
        assert_eq!(ex.tenant_id(), Some(TenantId::new(9)));

        let ex = engine_error(store.set_many([("a", json!(1))], None).unwrap_err());
        assert_eq!(ex.request_id().map(RequestId::as_str), Some("req-42"));
        assert_eq!(ex.tenant_id(), Some(TenantId::new(3)));
    }

    #[test]
    fn test_global_engine_failure_has_no_tenant() {
        let mut store = OptionStore::new(BrokenEngine, GuestProvider);

        let ex = engine_error(store.remove("theme", None).unwrap_err());
        assert_eq!(ex.tenant_id(), None);
        assert_eq!(ex.request_id(), None);
    }

    #[test]
    fn test_is_multi_tenant_follows_guest_flag() {
        let guest = OptionStore::new(MemoryEngine::new(), GuestProvider);
        assert!(!guest.is_multi_tenant());

        let user = OptionStore::new(MemoryEngine::new(), Identity::simple("bob"));
        assert!(user.is_multi_tenant());
    }

    #[test]
    fn test_build_filter_adds_tenant_only_when_present() {
        type Store = OptionStore<MemoryEngine>;
        assert_eq!(Store::build_filter("k", None).tenant_id, None);
        assert_eq!(
            Store::build_filter("k", Some(TenantId::new(0))).tenant_id,
            Some(TenantId::new(0))
        );
    }

    #[test]
    fn test_get_as_deserializes() {
        let mut store = OptionStore::new(MemoryEngine::new(), Identity::Anonymous);
        store.set("limits", json!({"max": 10}), None).unwrap();

        #[derive(serde::Deserialize, PartialEq, Debug)]
        struct Limits {
            max: u32,
        }

        let limits: Option<Limits> = store.get_as("limits", None).unwrap();
        assert_eq!(limits, Some(Limits { max: 10 }));

        let wrong: Result<Option<Vec<String>>> = store.get_as("limits", None);
        assert_eq!(wrong.unwrap_err().code(), "ERR_SERIALIZATION");
    }

    #[test]
    fn test_invalid_key_in_batch_writes_nothing() {
        let mut store = OptionStore::new(MemoryEngine::new(), Identity::Anonymous);
        let err = store
            .set_many([("ok", json!(1)), ("", json!(2))], None)
            .unwrap_err();

        assert!(matches!(err, OptionStoreError::InvalidKey { .. }));
        assert!(store.engine().is_empty());
    }

    #[test]
    fn test_with_identity_keeps_rows() {
        let mut store = OptionStore::new(MemoryEngine::new(), Identity::tenanted("a", 1));
        store.set("theme", json!("dark"), None).unwrap();

        let store = store.with_identity(Identity::tenanted("b", 2));
        assert_eq!(store.get("theme", None, None).unwrap(), None);
        assert_eq!(
            store.get("theme", None, Some(TenantId::new(1))).unwrap(),
            Some(json!("dark"))
        );
    }
}
