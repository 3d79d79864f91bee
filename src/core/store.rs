//! Session scoped record store.
//!
//! Each category keeps its records in insertion order. Identifiers are
//! normalized on the way in so lookups are case-insensitive.

use crate::core::error::{EngineError, Result};
use crate::core::holding::{
    Category, Crypto, Equity, FixedIncome, ForeignCurrency, Holding, Record, normalize_id,
};
use tracing::debug;

/// Whether an upsert created a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Ordered records of a single category, unique by identifier.
#[derive(Debug, Clone)]
pub struct Collection<H> {
    items: Vec<H>,
}

impl<H> Default for Collection<H> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<H: Holding> Collection<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and inserts the record, or overwrites the entry with the same
    /// identifier in place.
    pub fn upsert(&mut self, mut record: H) -> Result<UpsertOutcome> {
        let id = normalize_id(record.id());
        *record.id_mut() = id;
        record.validate()?;

        match self.items.iter().position(|r| r.id() == record.id()) {
            Some(idx) => {
                debug!(category = %H::CATEGORY, id = record.id(), "Upsert UPDATE");
                self.items[idx] = record;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                debug!(category = %H::CATEGORY, id = record.id(), "Upsert INSERT");
                self.items.push(record);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<H> {
        let id = normalize_id(id);
        let pos = self
            .items
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| EngineError::NotFound(format!("{id} in {}", H::CATEGORY)))?;
        debug!(category = %H::CATEGORY, id = %id, "REMOVE");
        Ok(self.items.remove(pos))
    }

    /// Replaces every record of the collection. The batch is validated before
    /// anything is touched, so a bad record leaves the collection unchanged.
    pub fn replace_all(&mut self, records: Vec<H>) -> Result<usize> {
        let mut staged = Collection::new();
        for record in records {
            staged.upsert(record)?;
        }
        debug!(
            category = %H::CATEGORY,
            previous = self.items.len(),
            current = staged.items.len(),
            "REPLACE ALL"
        );
        *self = staged;
        Ok(self.items.len())
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        let id = normalize_id(id);
        self.items.iter().find(|r| r.id() == id)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.id()).collect()
    }

    pub fn as_slice(&self) -> &[H] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, H> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// All holdings of one session. Created empty at session start and dropped at
/// session end; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub(crate) equities: Collection<Equity>,
    pub(crate) fixed_income: Collection<FixedIncome>,
    pub(crate) crypto: Collection<Crypto>,
    pub(crate) foreign_currencies: Collection<ForeignCurrency>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection<H: Holding>(&self) -> &Collection<H> {
        H::collection(self)
    }

    pub fn upsert_holding<H: Holding>(&mut self, record: H) -> Result<UpsertOutcome> {
        H::collection_mut(self).upsert(record)
    }

    pub fn upsert(&mut self, record: Record) -> Result<UpsertOutcome> {
        match record {
            Record::Equity(r) => self.upsert_holding(r),
            Record::FixedIncome(r) => self.upsert_holding(r),
            Record::Crypto(r) => self.upsert_holding(r),
            Record::ForeignCurrency(r) => self.upsert_holding(r),
        }
    }

    /// Removes a record by identifier. Unknown identifiers are a `NotFound` error.
    pub fn remove(&mut self, category: Category, id: &str) -> Result<Record> {
        match category {
            Category::Equity => self.equities.remove(id).map(Holding::into_record),
            Category::FixedIncome => self.fixed_income.remove(id).map(Holding::into_record),
            Category::Crypto => self.crypto.remove(id).map(Holding::into_record),
            Category::ForeignCurrency => {
                self.foreign_currencies.remove(id).map(Holding::into_record)
            }
        }
    }

    pub fn replace_all<H: Holding>(&mut self, records: Vec<H>) -> Result<usize> {
        H::collection_mut(self).replace_all(records)
    }

    pub fn len(&self, category: Category) -> usize {
        match category {
            Category::Equity => self.equities.len(),
            Category::FixedIncome => self.fixed_income.len(),
            Category::Crypto => self.crypto.len(),
            Category::ForeignCurrency => self.foreign_currencies.len(),
        }
    }

    pub fn identifiers(&self, category: Category) -> Vec<&str> {
        match category {
            Category::Equity => self.equities.identifiers(),
            Category::FixedIncome => self.fixed_income.identifiers(),
            Category::Crypto => self.crypto.identifiers(),
            Category::ForeignCurrency => self.foreign_currencies.identifiers(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.len(*c) == 0)
    }

    /// Categories holding at least one record, in canonical order.
    pub fn non_empty_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.len(*c) > 0)
            .collect()
    }

    pub fn clear(&mut self) {
        self.equities.clear();
        self.fixed_income.clear();
        self.crypto.clear();
        self.foreign_currencies.clear();
    }
}
