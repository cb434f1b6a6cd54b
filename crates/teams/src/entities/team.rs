use serde::{Deserialize, Serialize};

/// A team whose members may exchange messages in its group channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible id
    pub public_id: String,
    pub name: String,
    /// User ID of the creating organizer
    pub created_by: i64,
    pub created_at: String,
}
