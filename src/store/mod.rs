mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::models::Mapping;
use async_trait::async_trait;

/// A storage backend fault. Not-found is deliberately *not* a variant —
/// lookups return `Option` because an unknown code is an expected outcome,
/// not an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// The keyed store holding code → URL mappings.
///
/// This is the only shared mutable state in the service. All writes go
/// through [`try_insert`](MappingStore::try_insert), which must be atomic
/// per key: of any number of concurrent inserts for the same code, exactly
/// one succeeds and the rest observe `false`. A `get` issued after a
/// successful insert completes must see the inserted value.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Insert the pair only if `code` is absent. Returns whether the insert
    /// won; `false` means the code already maps to something (possibly a
    /// different URL) and the existing mapping is untouched.
    async fn try_insert(&self, code: &str, long_url: &str) -> Result<bool, StoreError>;

    /// Look up a code. `Ok(None)` is the normal miss result.
    async fn get(&self, code: &str) -> Result<Option<Mapping>, StoreError>;

    /// Advisory existence probe used by the code generator while searching
    /// for a free candidate. The authoritative check is `try_insert`.
    async fn exists(&self, code: &str) -> Result<bool, StoreError>;
}
