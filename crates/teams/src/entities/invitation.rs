use serde::{Deserialize, Serialize};

/// An invitation from a team organizer to a prospective member.
///
/// Mutated exactly once: the invited user moves it from `Pending` to either
/// terminal state. Acceptance also materializes the membership row, in the
/// same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible id
    pub public_id: String,
    pub team_id: i64,
    pub invited_user_id: i64,
    pub invited_by_id: i64,
    pub status: InvitationStatus,
    pub sent_at: String,
    pub responded_at: Option<String>,
}

/// Invitation lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl From<&str> for InvitationStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "accepted" => InvitationStatus::Accepted,
            "declined" => InvitationStatus::Declined,
            _ => InvitationStatus::Pending,
        }
    }
}

impl From<InvitationStatus> for String {
    fn from(status: InvitationStatus) -> Self {
        match status {
            InvitationStatus::Pending => "pending".to_string(),
            InvitationStatus::Accepted => "accepted".to_string(),
            InvitationStatus::Declined => "declined".to_string(),
        }
    }
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, InvitationStatus::Pending)
    }
}

/// Invitation joined with team context, for the invitee's pending list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationWithTeam {
    pub public_id: String,
    pub team_public_id: String,
    pub team_name: String,
    pub invited_by_public_id: String,
    pub status: InvitationStatus,
    pub sent_at: String,
}
