//! Repository for invitation data access.

use crate::entities::{Invitation, InvitationStatus, InvitationWithTeam};
use crate::types::TeamResult;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct InvitationRepository {
    pool: SqlitePool,
}

fn invitation_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Invitation, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Invitation {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        team_id: row.try_get("team_id")?,
        invited_user_id: row.try_get("invited_user_id")?,
        invited_by_id: row.try_get("invited_by_id")?,
        status: InvitationStatus::from(status.as_str()),
        sent_at: row.try_get("sent_at")?,
        responded_at: row.try_get("responded_at")?,
    })
}

impl InvitationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        team_id: i64,
        invited_user_id: i64,
        invited_by_id: i64,
    ) -> Result<Invitation, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        let public_id = cuid2::create_id();

        sqlx::query(
            "INSERT INTO invitations (public_id, team_id, invited_user_id, invited_by_id, status, sent_at)
             VALUES (?, ?, ?, ?, 'pending', ?)",
        )
        .bind(&public_id)
        .bind(team_id)
        .bind(invited_user_id)
        .bind(invited_by_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Invitation {
            id: self.id_for_public(&public_id).await?,
            public_id,
            team_id,
            invited_user_id,
            invited_by_id,
            status: InvitationStatus::Pending,
            sent_at: now,
            responded_at: None,
        })
    }

    async fn id_for_public(&self, public_id: &str) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM invitations WHERE public_id = ?")
            .bind(public_id)
            .fetch_one(&self.pool)
            .await?;
        row.try_get("id")
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> TeamResult<Option<Invitation>> {
        let row = sqlx::query(
            "SELECT id, public_id, team_id, invited_user_id, invited_by_id, status, sent_at, responded_at
             FROM invitations WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(invitation_from_row).transpose()?)
    }

    pub async fn has_pending(&self, team_id: i64, invited_user_id: i64) -> TeamResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invitations
             WHERE team_id = ? AND invited_user_id = ? AND status = 'pending'",
        )
        .bind(team_id)
        .bind(invited_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Pending invitations addressed to one user, oldest first.
    pub async fn list_pending_for_user(&self, user_id: i64) -> TeamResult<Vec<InvitationWithTeam>> {
        let rows = sqlx::query(
            "SELECT i.public_id, i.status, i.sent_at,
                    t.public_id AS team_public_id, t.name AS team_name,
                    u.public_id AS invited_by_public_id
             FROM invitations i
             JOIN teams t ON t.id = i.team_id
             JOIN users u ON u.id = i.invited_by_id
             WHERE i.invited_user_id = ? AND i.status = 'pending'
             ORDER BY i.sent_at ASC, i.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let invitations = rows
            .into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(InvitationWithTeam {
                    public_id: row.try_get("public_id")?,
                    team_public_id: row.try_get("team_public_id")?,
                    team_name: row.try_get("team_name")?,
                    invited_by_public_id: row.try_get("invited_by_public_id")?,
                    status: InvitationStatus::from(status.as_str()),
                    sent_at: row.try_get("sent_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(invitations)
    }
}
