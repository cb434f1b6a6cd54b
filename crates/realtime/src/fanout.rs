//! Persist-then-deliver message fanout.

use std::sync::Arc;

use huddle_teams::{MessageRecord, MessageRepository};
use tracing::debug;

use crate::error::{RealtimeError, RealtimeResult};
use crate::events::{MessagePayload, ServerEvent};
use crate::registry::ConnectionRegistry;

pub struct FanoutEngine {
    registry: Arc<ConnectionRegistry>,
    messages: MessageRepository,
}

impl FanoutEngine {
    pub fn new(registry: Arc<ConnectionRegistry>, messages: MessageRepository) -> Self {
        Self { registry, messages }
    }

    /// Publish a message to a team group.
    ///
    /// The publisher must currently be *joined* to the group — team
    /// membership alone is not enough. The group's publish lock is held
    /// from persist through delivery, which gives the per-team total
    /// order: once persist(m1) has begun, no later publish to the same
    /// team can persist or deliver ahead of it. The persisted record
    /// exists before any recipient sees the event, and a commit is never
    /// rolled back by a later disconnect.
    pub async fn publish(
        &self,
        session_id: &str,
        team_id: &str,
        content: &str,
    ) -> RealtimeResult<MessageRecord> {
        let handle = self
            .registry
            .session(session_id)
            .await
            .ok_or(RealtimeError::SessionNotFound)?;

        if !handle.is_joined(team_id).await {
            return Err(RealtimeError::denied("not joined to this team group"));
        }

        let group = self
            .registry
            .group(team_id)
            .await
            .ok_or_else(|| RealtimeError::denied("not joined to this team group"))?;

        let _publish_guard = group.publish_lock.lock().await;

        let record = self
            .messages
            .append_message(team_id, handle.identity().user_id, content)
            .await?;

        // Snapshot taken immediately after persistence; sessions joining
        // later recover the message from history instead.
        let recipients = self.registry.handles_in(team_id).await;
        let event = ServerEvent::Message {
            message: MessagePayload::from(&record),
        };
        let mut delivered = 0usize;
        for recipient in &recipients {
            if recipient.deliver(event.clone()) {
                delivered += 1;
            }
        }

        debug!(
            team = %team_id,
            message = %record.public_id,
            recipients = recipients.len(),
            delivered,
            "message fanned out"
        );

        Ok(record)
    }
}
