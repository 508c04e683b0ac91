use super::{MappingStore, StoreError};
use crate::models::Mapping;
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS mappings (
    code       TEXT PRIMARY KEY,
    long_url   TEXT NOT NULL,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// SQLite-backed mapping store.
///
/// The `code` primary key is the atomicity guarantee: a plain INSERT either
/// claims the code or fails with a unique violation, which `try_insert`
/// reports as a lost race rather than an error.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating the file if needed) and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(
                database_url
                    .parse::<sqlx::sqlite::SqliteConnectOptions>()?
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal),
            )
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MappingStore for SqliteStore {
    async fn try_insert(&self, code: &str, long_url: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT INTO mappings (code, long_url) VALUES (?1, ?2)")
            .bind(code)
            .bind(long_url)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_err)) if db_err.kind() == ErrorKind::UniqueViolation => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, code: &str) -> Result<Option<Mapping>, StoreError> {
        let mapping: Option<Mapping> = sqlx::query_as(
            "SELECT code, long_url, created_at FROM mappings WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    async fn exists(&self, code: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM mappings WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/mappings.db", dir.path().display());
        let store = SqliteStore::connect(&url).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let (_dir, store) = temp_store().await;

        assert!(store.try_insert("abc1234", "https://example.com").await.unwrap());
        let mapping = store.get("abc1234").await.unwrap().expect("mapping present");
        assert_eq!(mapping.long_url, "https://example.com");
        assert!(store.exists("abc1234").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_lost_race_not_an_error() {
        let (_dir, store) = temp_store().await;

        assert!(store.try_insert("dup", "https://first.example").await.unwrap());
        assert!(!store.try_insert("dup", "https://second.example").await.unwrap());

        // Winner is untouched.
        let mapping = store.get("dup").await.unwrap().unwrap();
        assert_eq!(mapping.long_url, "https://first.example");
    }

    #[tokio::test]
    async fn unknown_code_is_a_plain_miss() {
        let (_dir, store) = temp_store().await;
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_inserts_have_exactly_one_winner() {
        let (_dir, store) = temp_store().await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .try_insert("race", &format!("https://example.com/{i}"))
                    .await
                    .unwrap()
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);

        let mapping = store.get("race").await.unwrap().unwrap();
        assert!(mapping.long_url.starts_with("https://example.com/"));
    }
}
