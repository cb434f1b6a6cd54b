//! Membership authority: the source of truth for who belongs to a team.
//!
//! Authorization callers query this at request time; membership is never
//! cached as proof of access.

use crate::entities::{Team, TeamMember, TeamRole};
use crate::types::{TeamError, TeamResult};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::info;

#[derive(Clone)]
pub struct MembershipRepository {
    pool: SqlitePool,
}

impl MembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a team and materialize the creating organizer's membership.
    pub async fn create_team(&self, name: &str, created_by: i64) -> TeamResult<Team> {
        let now = Utc::now().to_rfc3339();
        let public_id = cuid2::create_id();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO teams (public_id, name, created_by, created_at) VALUES (?, ?, ?, ?)")
            .bind(&public_id)
            .bind(name)
            .bind(created_by)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT id FROM teams WHERE public_id = ?")
            .bind(&public_id)
            .fetch_one(&mut *tx)
            .await?;
        let team_id: i64 = row.try_get("id")?;

        sqlx::query(
            "INSERT INTO team_members (team_id, user_id, role, joined_at) VALUES (?, ?, 'organizer', ?)",
        )
        .bind(team_id)
        .bind(created_by)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(team = %public_id, user = created_by, "team created");

        Ok(Team {
            id: team_id,
            public_id,
            name: name.to_owned(),
            created_by,
            created_at: now,
        })
    }

    pub async fn find_team(&self, team_public_id: &str) -> TeamResult<Option<Team>> {
        let row = sqlx::query(
            "SELECT id, public_id, name, created_by, created_at FROM teams WHERE public_id = ?",
        )
        .bind(team_public_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Team {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            name: row.try_get("name")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    /// Team resolution that treats a missing team as an error.
    pub async fn resolve_team(&self, team_public_id: &str) -> TeamResult<Team> {
        self.find_team(team_public_id)
            .await?
            .ok_or_else(|| TeamError::team_not_found(team_public_id))
    }

    pub async fn find_team_public_id(&self, team_id: i64) -> TeamResult<String> {
        let row = sqlx::query("SELECT public_id FROM teams WHERE id = ?")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| TeamError::team_not_found(team_id.to_string()))?;
        Ok(row.try_get("public_id")?)
    }

    pub async fn find_membership(
        &self,
        team_public_id: &str,
        user_id: i64,
    ) -> TeamResult<Option<TeamMember>> {
        let row = sqlx::query(
            "SELECT m.id, m.team_id, m.user_id, m.role, m.joined_at
             FROM team_members m
             JOIN teams t ON t.id = m.team_id
             WHERE t.public_id = ? AND m.user_id = ?",
        )
        .bind(team_public_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: String = row.try_get("role")?;
        Ok(Some(TeamMember {
            id: row.try_get("id")?,
            team_id: row.try_get("team_id")?,
            user_id: row.try_get("user_id")?,
            role: TeamRole::from(role.as_str()),
            joined_at: row.try_get("joined_at")?,
        }))
    }

    pub async fn is_member(&self, team_public_id: &str, user_id: i64) -> TeamResult<bool> {
        Ok(self.find_membership(team_public_id, user_id).await?.is_some())
    }

    pub async fn is_organizer(&self, team_public_id: &str, user_id: i64) -> TeamResult<bool> {
        Ok(self
            .find_membership(team_public_id, user_id)
            .await?
            .map(|m| m.is_organizer())
            .unwrap_or(false))
    }

    pub async fn add_membership(
        &self,
        team_public_id: &str,
        user_id: i64,
        role: TeamRole,
    ) -> TeamResult<TeamMember> {
        let team = self.resolve_team(team_public_id).await?;
        let now = Utc::now().to_rfc3339();
        let role_str: String = role.into();

        sqlx::query(
            "INSERT OR IGNORE INTO team_members (team_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(team.id)
        .bind(user_id)
        .bind(&role_str)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_membership(team_public_id, user_id)
            .await?
            .ok_or_else(|| TeamError::team_not_found(team_public_id))
    }

    /// Remove a membership. Returns whether a row was actually deleted.
    pub async fn remove_membership(&self, team_public_id: &str, user_id: i64) -> TeamResult<bool> {
        let team = self.resolve_team(team_public_id).await?;

        let result = sqlx::query("DELETE FROM team_members WHERE team_id = ? AND user_id = ?")
            .bind(team.id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a team and everything hanging off it: memberships,
    /// invitations and messages go in the same transaction.
    pub async fn delete_team_cascade(&self, team_public_id: &str) -> TeamResult<()> {
        let team = self.resolve_team(team_public_id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM team_members WHERE team_id = ?")
            .bind(team.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM invitations WHERE team_id = ?")
            .bind(team.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM messages WHERE team_id = ?")
            .bind(team.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(team.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(team = %team_public_id, "team deleted with cascade");
        Ok(())
    }
}
