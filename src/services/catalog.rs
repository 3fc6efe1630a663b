use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogRecord, Item, ItemId},
};

/// Immutable, ordered list of recommendable items
///
/// Built once at startup. `items[i].index == i` holds for every item, so an
/// item's position doubles as its row in the similarity matrix.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    by_id: HashMap<ItemId, usize>,
}

/// Error raised while building a catalog from persisted records
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate item id {id} at rows {first} and {second}")]
    DuplicateId {
        id: ItemId,
        first: usize,
        second: usize,
    },
}

impl Catalog {
    /// Builds a catalog, assigning each record the index of its position
    pub fn from_records(records: Vec<CatalogRecord>) -> Result<Self, CatalogError> {
        let mut items = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            if let Some(first) = by_id.insert(record.id.clone(), index) {
                return Err(CatalogError::DuplicateId {
                    id: record.id,
                    first,
                    second: index,
                });
            }
            items.push(Item {
                id: record.id,
                title: record.title,
                index,
            });
        }

        Ok(Self { items, by_id })
    }

    /// Exact lookup by identity
    pub fn resolve(&self, id: &ItemId) -> AppResult<usize> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Item \"{}\" not found", id)))
    }

    /// Case-insensitive substring match over titles, in catalog order
    ///
    /// Titles are not unique; callers that need a single item should take the
    /// first index returned.
    pub fn resolve_by_title_substring(&self, query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .map(|item| item.index)
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }
}
