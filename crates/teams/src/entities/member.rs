use serde::{Deserialize, Serialize};

/// Membership of a user in a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Database primary key
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
    pub joined_at: String,
}

/// Role a member holds within one team.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Organizer,
    Member,
}

impl From<&str> for TeamRole {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "organizer" => TeamRole::Organizer,
            _ => TeamRole::Member,
        }
    }
}

impl From<TeamRole> for String {
    fn from(role: TeamRole) -> Self {
        match role {
            TeamRole::Organizer => "organizer".to_string(),
            TeamRole::Member => "member".to_string(),
        }
    }
}

impl TeamMember {
    pub fn is_organizer(&self) -> bool {
        matches!(self.role, TeamRole::Organizer)
    }
}
