//! Team and membership operations over the membership authority.

use crate::entities::{Team, TeamMember, TeamRole};
use crate::repositories::MembershipRepository;
use crate::types::{TeamError, TeamResult};
use sqlx::SqlitePool;
use tracing::info;

#[derive(Clone)]
pub struct MembershipService {
    memberships: MembershipRepository,
}

impl MembershipService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            memberships: MembershipRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &MembershipRepository {
        &self.memberships
    }

    pub async fn create_team(&self, name: &str, created_by: i64) -> TeamResult<Team> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TeamError::forbidden("team name must not be empty"));
        }
        self.memberships.create_team(name, created_by).await
    }

    pub async fn find_team(&self, team_public_id: &str) -> TeamResult<Option<Team>> {
        self.memberships.find_team(team_public_id).await
    }

    pub async fn is_member(&self, team_public_id: &str, user_id: i64) -> TeamResult<bool> {
        self.memberships.is_member(team_public_id, user_id).await
    }

    pub async fn is_organizer(&self, team_public_id: &str, user_id: i64) -> TeamResult<bool> {
        self.memberships.is_organizer(team_public_id, user_id).await
    }

    pub async fn add_membership(
        &self,
        team_public_id: &str,
        user_id: i64,
        role: TeamRole,
    ) -> TeamResult<TeamMember> {
        self.memberships
            .add_membership(team_public_id, user_id, role)
            .await
    }

    /// Remove a member on behalf of an organizer. Returns whether a
    /// membership row actually existed; callers must still force-leave the
    /// user's live sessions afterwards.
    pub async fn remove_member(
        &self,
        team_public_id: &str,
        acting_user_id: i64,
        target_user_id: i64,
    ) -> TeamResult<bool> {
        if !self
            .memberships
            .is_organizer(team_public_id, acting_user_id)
            .await?
        {
            return Err(TeamError::forbidden("only organizers may remove members"));
        }

        let removed = self
            .memberships
            .remove_membership(team_public_id, target_user_id)
            .await?;

        if removed {
            info!(team = %team_public_id, user = target_user_id, "membership removed");
        }

        Ok(removed)
    }

    /// Delete a team and cascade over memberships, invitations and
    /// messages. Callers must disband the live group afterwards.
    pub async fn delete_team(&self, team_public_id: &str, acting_user_id: i64) -> TeamResult<()> {
        if !self
            .memberships
            .is_organizer(team_public_id, acting_user_id)
            .await?
        {
            return Err(TeamError::forbidden("only organizers may delete a team"));
        }

        self.memberships.delete_team_cascade(team_public_id).await
    }
}
