//! Persistence engine seam
//!
//! The option store owns the scoping rule; an engine owns the rows. Engines
//! only ever see equality filters built by the store, so any backend that
//! can answer "rows where key = ? [and tenant_id = ?]" can host options.

mod memory;

pub use memory::MemoryEngine;

use crate::errors::ExError;
use crate::filter::{Filter, SetValues};
use crate::model::OptionRow;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, ExError>;

/// Storage backend for the `options` table
pub trait PersistenceEngine {
    /// Whether any row matches `filter`
    fn exists(&self, filter: &Filter) -> EngineResult<bool>;

    /// First matching row in [`match_rank`](crate::filter::match_rank) order
    fn find_one(&self, filter: &Filter) -> EngineResult<Option<OptionRow>>;

    /// Update the first row matching `filter`, or insert one if none matches
    ///
    /// Must be atomic with respect to other writers of the same backend.
    fn upsert(&mut self, filter: &Filter, values: &SetValues) -> EngineResult<()>;

    /// Delete every row matching `filter`, returning how many were removed
    fn delete_all(&mut self, filter: &Filter) -> EngineResult<usize>;
}

impl<E: PersistenceEngine + ?Sized> PersistenceEngine for Box<E> {
    fn exists(&self, filter: &Filter) -> EngineResult<bool> {
        (**self).exists(filter)
    }

    fn find_one(&self, filter: &Filter) -> EngineResult<Option<OptionRow>> {
        (**self).find_one(filter)
    }

    fn upsert(&mut self, filter: &Filter, values: &SetValues) -> EngineResult<()> {
        (**self).upsert(filter, values)
    }

    fn delete_all(&mut self, filter: &Filter) -> EngineResult<usize> {
        (**self).delete_all(filter)
    }
}
