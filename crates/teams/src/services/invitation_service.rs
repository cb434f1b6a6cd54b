//! Invitation lifecycle: Pending -> Accepted | Declined.

use crate::entities::{Invitation, InvitationStatus, InvitationWithTeam};
use crate::repositories::{InvitationRepository, MembershipRepository};
use crate::types::{TeamError, TeamResult};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::info;

#[derive(Clone)]
pub struct InvitationService {
    pool: SqlitePool,
    invitations: InvitationRepository,
    memberships: MembershipRepository,
}

impl InvitationService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            invitations: InvitationRepository::new(pool.clone()),
            memberships: MembershipRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a pending invitation.
    ///
    /// Only an organizer of the team may invite, and at most one pending
    /// invitation may exist per (team, user). A concurrent duplicate loses
    /// the race on the partial unique index and is reported as
    /// `AlreadyInvited`, same as the pre-check.
    pub async fn create(
        &self,
        team_public_id: &str,
        inviter_id: i64,
        invitee_user_id: i64,
    ) -> TeamResult<Invitation> {
        let team = self.memberships.resolve_team(team_public_id).await?;

        if !self.memberships.is_organizer(team_public_id, inviter_id).await? {
            return Err(TeamError::forbidden("only organizers may invite"));
        }

        if self.invitations.has_pending(team.id, invitee_user_id).await? {
            return Err(TeamError::AlreadyInvited);
        }

        match self.invitations.insert(team.id, invitee_user_id, inviter_id).await {
            Ok(invitation) => {
                info!(team = %team_public_id, invitee = invitee_user_id, "invitation created");
                Ok(invitation)
            }
            Err(err)
                if err
                    .as_database_error()
                    .map_or(false, |db| db.is_unique_violation()) =>
            {
                Err(TeamError::AlreadyInvited)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Resolve a pending invitation.
    ///
    /// Only the invited user may respond, and only once: a second respond
    /// fails with `NotPending` rather than silently succeeding. On accept
    /// the status flip and the membership insert commit together, so
    /// `Accepted` is never observable without the membership row.
    pub async fn respond(
        &self,
        invitation_public_id: &str,
        responder_id: i64,
        accept: bool,
    ) -> TeamResult<Invitation> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, public_id, team_id, invited_user_id, invited_by_id, status, sent_at
             FROM invitations WHERE public_id = ?",
        )
        .bind(invitation_public_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(TeamError::invitation_not_found(invitation_public_id));
        };

        let invitation_id: i64 = row.try_get("id")?;
        let team_id: i64 = row.try_get("team_id")?;
        let invited_user_id: i64 = row.try_get("invited_user_id")?;
        let invited_by_id: i64 = row.try_get("invited_by_id")?;
        let sent_at: String = row.try_get("sent_at")?;

        if invited_user_id != responder_id {
            return Err(TeamError::forbidden(
                "only the invited user may respond to an invitation",
            ));
        }

        let status = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Declined
        };
        let status_str: String = status.into();
        let responded_at = Utc::now().to_rfc3339();

        let updated = sqlx::query(
            "UPDATE invitations SET status = ?, responded_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(&status_str)
        .bind(&responded_at)
        .bind(invitation_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(TeamError::NotPending);
        }

        if accept {
            let now = Utc::now().to_rfc3339();
            sqlx::query(
                "INSERT OR IGNORE INTO team_members (team_id, user_id, role, joined_at) VALUES (?, ?, 'member', ?)",
            )
            .bind(team_id)
            .bind(invited_user_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            invitation = %invitation_public_id,
            accepted = accept,
            "invitation resolved"
        );

        Ok(Invitation {
            id: invitation_id,
            public_id: invitation_public_id.to_owned(),
            team_id,
            invited_user_id,
            invited_by_id,
            status,
            sent_at,
            responded_at: Some(responded_at),
        })
    }

    pub async fn list_pending_for_user(&self, user_id: i64) -> TeamResult<Vec<InvitationWithTeam>> {
        self.invitations.list_pending_for_user(user_id).await
    }

    pub async fn find(&self, invitation_public_id: &str) -> TeamResult<Option<Invitation>> {
        self.invitations.find_by_public_id(invitation_public_id).await
    }
}
