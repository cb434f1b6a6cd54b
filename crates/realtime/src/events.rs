//! Wire protocol events exchanged over a realtime connection.

use huddle_teams::MessageRecord;
use serde::{Deserialize, Serialize};

/// Client events received over the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Heartbeat to keep the connection alive
    Ping,
    /// Subscribe to a team's group channel
    JoinTeam { team_id: String },
    /// Unsubscribe from a team's group channel
    LeaveTeam { team_id: String },
    /// Publish a message to a joined team
    SendMessage { team_id: String, content: String },
}

/// Server events pushed to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Welcome message after a successful bind
    Hello { user_id: String },
    /// Heartbeat response
    Pong,
    /// Join confirmation
    Joined { team_id: String },
    /// Leave confirmation
    Left { team_id: String },
    /// A message published to a joined team
    Message { message: MessagePayload },
    /// Server-initiated removal after a membership revocation
    ForcedLeave { team_id: String },
    /// The team was deleted; its group no longer exists
    TeamDeleted { team_id: String },
    /// Request-level failure; the connection stays up
    Error { code: String, message: String },
}

/// Message body as delivered to clients. `id` doubles as the client-side
/// dedup key across reconnects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

impl From<&MessageRecord> for MessagePayload {
    fn from(record: &MessageRecord) -> Self {
        Self {
            id: record.public_id.clone(),
            team_id: record.team_public_id.clone(),
            user_id: record.user_public_id.clone(),
            content: record.content.clone(),
            created_at: record.created_at.clone(),
        }
    }
}
