use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use pinhole_core::repository::Result;
use pinhole_core::{Mapping, MappingPatch, ReadRepository, RenameOutcome, Repository, ShortCode};
use std::sync::atomic::{AtomicU64, Ordering};

type RowId = u64;

/// In-memory implementation of the Repository trait using DashMap.
///
/// Records live in `rows`, keyed by a row id that never changes, and `codes`
/// indexes them by short code. A rename therefore only moves an index entry
/// and the access counter stays with the row.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing operations on different codes to proceed
/// without blocking each other.
///
/// Locking rules:
/// - a `codes` guard is never held while acquiring a `rows` guard;
/// - every change to `codes` that concerns a row happens while that row's
///   `rows` guard is held, so a reader that locks the row and finds the code
///   it looked up is guaranteed the index still agrees.
#[derive(Debug)]
pub struct InMemoryRepository {
    codes: DashMap<String, RowId>,
    rows: DashMap<RowId, Mapping>,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            codes: DashMap::new(),
            rows: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            codes: DashMap::with_capacity(capacity),
            rows: DashMap::with_capacity(capacity),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of live mappings.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn locate(&self, code: &ShortCode) -> Option<RowId> {
        self.codes.get(code.as_str()).map(|id| *id)
    }

    /// Runs `f` on the row currently holding `code`, under the row's write lock.
    ///
    /// If the index entry goes stale between the two lookups (the row was
    /// renamed or deleted meanwhile) the lookup starts over.
    fn with_row_mut<T>(&self, code: &ShortCode, f: impl FnOnce(&mut Mapping) -> T) -> Option<T> {
        loop {
            let id = self.locate(code)?;
            if let Some(mut row) = self.rows.get_mut(&id) {
                if row.code == *code {
                    return Some(f(&mut *row));
                }
            }
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<Mapping>> {
        loop {
            let Some(id) = self.locate(code) else {
                return Ok(None);
            };
            if let Some(row) = self.rows.get(&id) {
                if row.code == *code {
                    return Ok(Some(row.value().clone()));
                }
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<Mapping>> {
        let mut rows: Vec<(RowId, Mapping)> = self
            .rows
            .iter()
            .map(|row| (*row.key(), row.value().clone()))
            .collect();
        rows.sort_unstable_by_key(|(id, _)| *id);
        Ok(rows.into_iter().map(|(_, mapping)| mapping).collect())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert_if_absent(&self, mapping: &Mapping) -> Result<bool> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Hold the (still empty) row slot while claiming the code so that no
        // reader can follow the new index entry before the row is in place.
        let Entry::Vacant(slot) = self.rows.entry(id) else {
            return Err(pinhole_core::StorageError::InvalidData(format!(
                "row id {id} allocated twice"
            )));
        };

        let claimed = match self.codes.entry(mapping.code.as_str().to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(id);
                true
            }
        };

        if claimed {
            slot.insert(mapping.clone());
        }
        Ok(claimed)
    }

    async fn atomic_increment(&self, code: &ShortCode) -> Result<Option<Mapping>> {
        Ok(self.with_row_mut(code, |row| {
            row.access_count = row.access_count.saturating_add(1);
            row.clone()
        }))
    }

    async fn update(&self, code: &ShortCode, patch: MappingPatch) -> Result<Option<Mapping>> {
        Ok(self.with_row_mut(code, |row| {
            patch.apply(row);
            row.clone()
        }))
    }

    async fn rename_if_absent(
        &self,
        from: &ShortCode,
        to: &ShortCode,
        now: Timestamp,
    ) -> Result<RenameOutcome> {
        if from == to {
            let touched = self.update(from, MappingPatch::touch(now)).await?;
            return Ok(touched.map_or(RenameOutcome::SourceMissing, RenameOutcome::Renamed));
        }

        loop {
            let Some(id) = self.locate(from) else {
                return Ok(RenameOutcome::SourceMissing);
            };
            let Some(mut row) = self.rows.get_mut(&id) else {
                continue;
            };
            if row.code != *from {
                continue;
            }

            let claimed = match self.codes.entry(to.as_str().to_owned()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(entry) => {
                    entry.insert(id);
                    true
                }
            };
            if !claimed {
                return Ok(RenameOutcome::TargetTaken);
            }

            self.codes.remove(from.as_str());
            row.code = to.clone();
            row.updated_at = now;
            return Ok(RenameOutcome::Renamed(row.value().clone()));
        }
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        loop {
            let Some(id) = self.locate(code) else {
                return Ok(false);
            };

            let removed = self.rows.remove_if(&id, |_, row| {
                if row.code != *code {
                    return false;
                }
                self.codes.remove(code.as_str());
                true
            });

            if removed.is_some() {
                return Ok(true);
            }
        }
    }
}
