use serde::{Deserialize, Serialize};

/// A persisted chat message. Immutable once written; `id` is the per-team
/// ordering key (insertion order), `created_at` is wall-clock RFC3339.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Database primary key and ordering key
    pub id: i64,
    /// Publicly accessible id (client-side dedup key)
    pub public_id: String,
    #[serde(skip_serializing)]
    pub team_id: i64,
    pub team_public_id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub user_public_id: String,
    pub content: String,
    pub created_at: String,
}
