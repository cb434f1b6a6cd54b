//! History storage for chat messages.

use crate::entities::MessageRecord;
use crate::types::{TeamError, TeamResult};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MessageRecord, sqlx::Error> {
    Ok(MessageRecord {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        team_id: row.try_get("team_id")?,
        team_public_id: row.try_get("team_public_id")?,
        user_id: row.try_get("user_id")?,
        user_public_id: row.try_get("user_public_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one message. The returned record carries the assigned
    /// ordering id; delivery must not start before this returns.
    pub async fn append_message(
        &self,
        team_public_id: &str,
        user_id: i64,
        content: &str,
    ) -> TeamResult<MessageRecord> {
        let team_row = sqlx::query("SELECT id FROM teams WHERE public_id = ?")
            .bind(team_public_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| TeamError::team_not_found(team_public_id))?;
        let team_id: i64 = team_row.try_get("id")?;

        let now = Utc::now().to_rfc3339();
        let public_id = cuid2::create_id();

        sqlx::query(
            "INSERT INTO messages (public_id, team_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(team_id)
        .bind(user_id)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT m.id, m.public_id, m.team_id, m.user_id, m.content, m.created_at,
                    t.public_id AS team_public_id, u.public_id AS user_public_id
             FROM messages m
             JOIN teams t ON t.id = m.team_id
             JOIN users u ON u.id = m.user_id
             WHERE m.public_id = ?",
        )
        .bind(&public_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record_from_row(&row)?)
    }

    /// One page of a team's history in insertion order. Restartable and
    /// finite: page numbering starts at 0.
    pub async fn list_messages(
        &self,
        team_public_id: &str,
        page: u32,
        page_size: u32,
    ) -> TeamResult<Vec<MessageRecord>> {
        let page_size = page_size.clamp(1, 500);
        let offset = i64::from(page) * i64::from(page_size);

        let rows = sqlx::query(
            "SELECT m.id, m.public_id, m.team_id, m.user_id, m.content, m.created_at,
                    t.public_id AS team_public_id, u.public_id AS user_public_id
             FROM messages m
             JOIN teams t ON t.id = m.team_id
             JOIN users u ON u.id = m.user_id
             WHERE t.public_id = ?
             ORDER BY m.id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(team_public_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
