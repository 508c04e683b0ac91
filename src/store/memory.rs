use super::{MappingStore, StoreError};
use crate::models::Mapping;
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;

/// Thread-safe in-memory mapping store.
///
/// Backed by a DashMap so reads are concurrent and writes to different
/// codes never contend. The entry API makes `try_insert` a single atomic
/// check-and-insert for a given code — there is no window between the
/// absence check and the write.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Mapping>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Number of mappings currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl MappingStore for MemoryStore {
    async fn try_insert(&self, code: &str, long_url: &str) -> Result<bool, StoreError> {
        match self.inner.entry(code.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(Mapping {
                    code: code.to_owned(),
                    long_url: long_url.to_owned(),
                    created_at: chrono::Utc::now().naive_utc(),
                });
                Ok(true)
            }
        }
    }

    async fn get(&self, code: &str) -> Result<Option<Mapping>, StoreError> {
        Ok(self.inner.get(code).map(|entry| entry.clone()))
    }

    async fn exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.inner.contains_key(code))
    }
}
