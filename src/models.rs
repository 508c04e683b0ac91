use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A short-code → long-URL mapping from the `mappings` table.
///
/// Once inserted a mapping is immutable: the code is never reassigned to a
/// different URL and rows are never deleted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Mapping {
    pub code: String,
    pub long_url: String,
    pub created_at: NaiveDateTime,
}

/// Request body for `POST /shorten`.
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

/// Response body for a successful `POST /shorten`.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub url: String,
}
