//! Equality filters and upsert payloads handed to a persistence engine

use crate::model::{OptionRow, OptionValue, TenantId};

/// Equality predicate over the `options` table
///
/// `key` always participates. `tenant_id` participates only when present;
/// a key-only filter matches the key in every scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub key: String,
    pub tenant_id: Option<TenantId>,
}

impl Filter {
    /// Filter on `key`, narrowed to `tenant_id` when one is given
    pub fn new(key: impl Into<String>, tenant_id: Option<TenantId>) -> Self {
        Self {
            key: key.into(),
            tenant_id,
        }
    }

    pub fn matches(&self, row: &OptionRow) -> bool {
        if row.key != self.key {
            return false;
        }
        match self.tenant_id {
            Some(tenant_id) => row.tenant_id == Some(tenant_id),
            None => true,
        }
    }
}

/// Columns written by an upsert
///
/// `tenant_id` is written only for tenant-scoped upserts. A global upsert
/// that lands on an existing row leaves that row's tenant untouched; one that
/// inserts creates a global row.
#[derive(Debug, Clone, PartialEq)]
pub struct SetValues {
    pub value: OptionValue,
    pub tenant_id: Option<TenantId>,
}

impl SetValues {
    pub fn new(value: OptionValue, tenant_id: Option<TenantId>) -> Self {
        Self { value, tenant_id }
    }
}

/// Order in which rows matched by one filter are considered
///
/// Global rows come first, then older rows before newer ones. Engines use it
/// for `find_one` and for choosing the row an upsert updates.
pub fn match_rank(row: &OptionRow) -> (bool, i64) {
    (row.tenant_id.is_some(), row.id)
}
