use super::{EngineResult, PersistenceEngine};
use crate::filter::{match_rank, Filter, SetValues};
use crate::model::OptionRow;

/// In-memory engine
///
/// Rows live in a `Vec` in insertion order with monotonically increasing ids.
/// Not thread-safe; mutation goes through `&mut self`, which already makes
/// each upsert atomic for the single owner.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    rows: Vec<OptionRow>,
    next_id: i64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// All rows, oldest first
    pub fn rows(&self) -> &[OptionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn first_match_index(&self, filter: &Filter) -> Option<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .min_by_key(|(_, row)| match_rank(row))
            .map(|(idx, _)| idx)
    }

    fn allocate_id(&mut self) -> i64 {
        // Default::default() leaves next_id at 0
        if self.next_id < 1 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl PersistenceEngine for MemoryEngine {
    fn exists(&self, filter: &Filter) -> EngineResult<bool> {
        Ok(self.rows.iter().any(|row| filter.matches(row)))
    }

    fn find_one(&self, filter: &Filter) -> EngineResult<Option<OptionRow>> {
        Ok(self.first_match_index(filter).map(|idx| self.rows[idx].clone()))
    }

    fn upsert(&mut self, filter: &Filter, values: &SetValues) -> EngineResult<()> {
        match self.first_match_index(filter) {
            Some(idx) => {
                let row = &mut self.rows[idx];
                row.value = values.value.clone();
                if values.tenant_id.is_some() {
                    row.tenant_id = values.tenant_id;
                }
            }
            None => {
                let id = self.allocate_id();
                self.rows.push(OptionRow {
                    id,
                    key: filter.key.clone(),
                    value: values.value.clone(),
                    tenant_id: values.tenant_id.or(filter.tenant_id),
                });
            }
        }
        Ok(())
    }

    fn delete_all(&mut self, filter: &Filter) -> EngineResult<usize> {
        let before = self.rows.len();
        self.rows.retain(|row| !filter.matches(row));
        Ok(before - self.rows.len())
    }
}
