use crate::store::{MappingStore, StoreError};
use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Candidate attempts per code length before growing the code by one char.
const MAX_ATTEMPTS_PER_LENGTH: u32 = 10;

/// How many times the code may grow past the configured length. With a
/// 62-symbol alphabet even one extra character drops the collision odds by
/// a factor of 62, so running out here means the store is far too full for
/// the configured length.
const MAX_LENGTH_STEPS: usize = 3;

/// How many lost `try_insert` races to tolerate before giving up. A free
/// candidate can be claimed by a concurrent request between the existence
/// probe and our insert; losing this race repeatedly has the same root
/// cause as exhausting the probe loop.
const MAX_INSERT_RACES: u32 = 5;

pub const DEFAULT_CODE_LENGTH: usize = 7;

#[derive(Debug, thiserror::Error)]
pub enum ShortenError {
    /// No free code found within the retry and length-escalation bounds.
    /// This is a configuration fault (code length too small for the store
    /// size), not a transient condition.
    #[error("no free short code after {attempts} attempts (lengths {min_length}–{max_length})")]
    ExhaustedRetries {
        attempts: u32,
        min_length: usize,
        max_length: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generates short codes and orchestrates their atomic insertion.
///
/// Holds no state beyond the configured starting length; the store is the
/// single source of truth for which codes are taken.
#[derive(Clone, Debug)]
pub struct Shortener {
    code_length: usize,
}

impl Shortener {
    pub fn new(code_length: usize) -> Self {
        Self { code_length }
    }

    /// Generate a random code of the given length over the base62 alphabet.
    fn candidate(&self, len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Find a code not currently present in the store.
    ///
    /// Tries up to [`MAX_ATTEMPTS_PER_LENGTH`] candidates at the configured
    /// length, then escalates the length one character at a time (up to
    /// [`MAX_LENGTH_STEPS`]) before reporting [`ShortenError::ExhaustedRetries`].
    ///
    /// The existence probe is advisory: a returned code can still be taken
    /// by a concurrent writer, which is why insertion goes through the
    /// store's atomic `try_insert` rather than trusting this result.
    pub async fn generate(&self, store: &dyn MappingStore) -> Result<String, ShortenError> {
        let mut attempts = 0;
        self.find_free(store, &mut attempts).await
    }

    /// The probe loop behind [`generate`](Self::generate). `attempts` is
    /// cumulative so callers that re-enter after a lost insert race report
    /// the real total, not a per-call count.
    async fn find_free(
        &self,
        store: &dyn MappingStore,
        attempts: &mut u32,
    ) -> Result<String, ShortenError> {
        for step in 0..=MAX_LENGTH_STEPS {
            let len = self.code_length + step;
            for _ in 0..MAX_ATTEMPTS_PER_LENGTH {
                let code = self.candidate(len);
                *attempts += 1;
                if !store.exists(&code).await? {
                    return Ok(code);
                }
            }
            tracing::warn!(
                "all {} candidates of length {} collided, growing code length",
                MAX_ATTEMPTS_PER_LENGTH,
                len
            );
        }

        Err(ShortenError::ExhaustedRetries {
            attempts: *attempts,
            min_length: self.code_length,
            max_length: self.code_length + MAX_LENGTH_STEPS,
        })
    }

    /// Shorten a URL: find a free code and claim it atomically.
    ///
    /// `try_insert` is the authoritative check — if another request claims
    /// the candidate between our probe and our insert, the loop simply
    /// generates a fresh one. Dropping this future mid-loop leaves no
    /// partial state; once `try_insert` has returned `true` the mapping
    /// stands regardless of what happens to the caller.
    pub async fn shorten(
        &self,
        store: &dyn MappingStore,
        long_url: &str,
    ) -> Result<String, ShortenError> {
        let mut attempts = 0;
        let mut races = 0;
        loop {
            let code = self.find_free(store, &mut attempts).await?;
            if store.try_insert(&code, long_url).await? {
                return Ok(code);
            }

            races += 1;
            tracing::debug!("lost insert race for code '{}' (attempt {})", code, races);
            if races >= MAX_INSERT_RACES {
                return Err(ShortenError::ExhaustedRetries {
                    attempts,
                    min_length: self.code_length,
                    max_length: self.code_length + MAX_LENGTH_STEPS,
                });
            }
        }
    }
}

impl Default for Shortener {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mapping;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::collections::HashSet;

    #[test]
    fn candidates_use_the_fixed_alphabet_and_length() {
        let shortener = Shortener::default();
        for _ in 0..100 {
            let code = shortener.candidate(DEFAULT_CODE_LENGTH);
            assert_eq!(code.len(), DEFAULT_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[tokio::test]
    async fn shorten_mints_unique_codes() {
        let store = MemoryStore::new();
        let shortener = Shortener::default();

        let mut seen = HashSet::new();
        for i in 0..500 {
            let url = format!("https://example.com/page/{i}");
            let code = shortener.shorten(&store, &url).await.unwrap();
            assert!(seen.insert(code.clone()), "duplicate code generated");

            let mapping = store.get(&code).await.unwrap().unwrap();
            assert_eq!(mapping.long_url, url);
        }
    }

    #[tokio::test]
    async fn same_url_twice_gets_two_codes() {
        let store = MemoryStore::new();
        let shortener = Shortener::default();

        let a = shortener.shorten(&store, "https://example.com").await.unwrap();
        let b = shortener.shorten(&store, "https://example.com").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn escalates_length_when_a_tier_is_full() {
        let store = MemoryStore::new();

        // Saturate every single-character code.
        for &byte in ALPHABET {
            let code = (byte as char).to_string();
            assert!(store.try_insert(&code, "https://taken.example").await.unwrap());
        }

        let shortener = Shortener::new(1);
        let code = shortener.shorten(&store, "https://example.com").await.unwrap();
        assert!(code.len() > 1, "expected escalation past length 1, got '{code}'");
    }

    /// A store where every code is already taken, to drive the generator
    /// to its bounds.
    struct SaturatedStore;

    #[async_trait]
    impl MappingStore for SaturatedStore {
        async fn try_insert(&self, _code: &str, _long_url: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn get(&self, _code: &str) -> Result<Option<Mapping>, StoreError> {
            Ok(None)
        }

        async fn exists(&self, _code: &str) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    /// A store whose probe always reports free but whose insert always
    /// loses, as if a concurrent writer claims every candidate first.
    struct RacyStore;

    #[async_trait]
    impl MappingStore for RacyStore {
        async fn try_insert(&self, _code: &str, _long_url: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn get(&self, _code: &str) -> Result<Option<Mapping>, StoreError> {
            Ok(None)
        }

        async fn exists(&self, _code: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn lost_races_report_the_probe_attempts_actually_made() {
        let shortener = Shortener::default();
        let err = shortener
            .shorten(&RacyStore, "https://example.com")
            .await
            .unwrap_err();

        // Each round costs exactly one probe here (the first candidate is
        // always reported free), so the count is the number of rounds.
        match err {
            ShortenError::ExhaustedRetries { attempts, .. } => {
                assert_eq!(attempts, MAX_INSERT_RACES);
            }
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reports_exhausted_retries_instead_of_looping_forever() {
        let shortener = Shortener::default();
        let err = shortener
            .shorten(&SaturatedStore, "https://example.com")
            .await
            .unwrap_err();

        match err {
            ShortenError::ExhaustedRetries { attempts, .. } => {
                assert!(attempts <= MAX_ATTEMPTS_PER_LENGTH * (MAX_LENGTH_STEPS as u32 + 1));
            }
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
    }
}
