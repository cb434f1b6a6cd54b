//! Join/leave handling for team groups.
//!
//! Authorization is re-validated against the membership authority at
//! request time; being a member when the connection was bound grants
//! nothing here.

use std::sync::Arc;

use huddle_teams::MembershipRepository;
use tracing::info;

use crate::error::{RealtimeError, RealtimeResult};
use crate::events::ServerEvent;
use crate::registry::ConnectionRegistry;

pub struct GroupManager {
    registry: Arc<ConnectionRegistry>,
    memberships: MembershipRepository,
}

impl GroupManager {
    pub fn new(registry: Arc<ConnectionRegistry>, memberships: MembershipRepository) -> Self {
        Self {
            registry,
            memberships,
        }
    }

    /// Subscribe a session to a team's group. The membership authority is
    /// queried now, not at connect time: a user removed since login is
    /// denied here.
    pub async fn join(&self, session_id: &str, team_id: &str) -> RealtimeResult<()> {
        let handle = self
            .registry
            .session(session_id)
            .await
            .ok_or(RealtimeError::SessionNotFound)?;

        let user_id = handle.identity().user_id;
        if !self.memberships.is_member(team_id, user_id).await? {
            return Err(RealtimeError::denied("not a member of this team"));
        }

        self.registry.add_to_group(&handle, team_id).await;
        info!(session = %session_id, team = %team_id, "joined group");
        Ok(())
    }

    /// Unsubscribe one's own session. Idempotent; leaving a group the
    /// session never joined is a successful no-op.
    pub async fn leave(&self, session_id: &str, team_id: &str) -> RealtimeResult<()> {
        let handle = self
            .registry
            .session(session_id)
            .await
            .ok_or(RealtimeError::SessionNotFound)?;

        self.registry.remove_from_group(&handle, team_id).await;
        Ok(())
    }

    /// Server-initiated removal after a membership revocation. Walks every
    /// live session of the user — they may be connected from several
    /// clients at once — and notifies each.
    pub async fn force_leave(&self, team_id: &str, user_id: i64) {
        let handles = self.registry.handles_in(team_id).await;
        for handle in handles {
            if handle.identity().user_id != user_id {
                continue;
            }
            self.registry.remove_from_group(&handle, team_id).await;
            handle.deliver(ServerEvent::ForcedLeave {
                team_id: team_id.to_owned(),
            });
            info!(session = %handle.id(), team = %team_id, "force-left group");
        }
    }

    /// Remove a whole group when its team is deleted, notifying every
    /// session that was in it.
    pub async fn disband(&self, team_id: &str) {
        let handles = self.registry.take_group_members(team_id).await;
        for handle in &handles {
            handle.deliver(ServerEvent::TeamDeleted {
                team_id: team_id.to_owned(),
            });
        }
        if !handles.is_empty() {
            info!(team = %team_id, sessions = handles.len(), "group disbanded");
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
