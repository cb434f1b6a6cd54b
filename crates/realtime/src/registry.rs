//! The connection registry: every live connection, the identity bound to
//! it, and the set of team groups it has joined.
//!
//! Locking is fine-grained on purpose. The outer maps are only locked to
//! look entries up or to add/remove them; each session's joined-set and
//! each group's member-set sit behind their own mutex, so activity on one
//! team never serializes against another. No I/O happens under any
//! registry lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use huddle_auth::Identity;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::events::ServerEvent;

pub type SessionId = String;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Unknown session id. Disconnect races are expected; callers treat
    /// this as a no-op, never as a fault.
    #[error("session not found")]
    SessionNotFound,
}

/// One live connection with its bound identity and outbound queue.
pub struct SessionHandle {
    id: SessionId,
    identity: Identity,
    sender: mpsc::Sender<ServerEvent>,
    joined: Mutex<HashSet<String>>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub async fn is_joined(&self, team_id: &str) -> bool {
        self.joined.lock().await.contains(team_id)
    }

    /// Enqueue an event for this connection. Lossy: a full or closed
    /// queue drops the frame (the client heals via history retrieval).
    pub fn deliver(&self, event: ServerEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session = %self.id, "outbound queue full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

pub(crate) struct TeamGroup {
    pub(crate) members: Mutex<HashSet<SessionId>>,
    /// Serializes persist + delivery per team (see the fanout engine).
    pub(crate) publish_lock: Mutex<()>,
}

pub struct ConnectionRegistry {
    delivery_buffer: usize,
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
    groups: RwLock<HashMap<String, Arc<TeamGroup>>>,
}

impl ConnectionRegistry {
    pub fn new(delivery_buffer: usize) -> Self {
        Self {
            delivery_buffer: delivery_buffer.max(1),
            sessions: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session for a bound identity. The returned receiver is the
    /// connection's outbound event stream; dropping it ends delivery.
    pub async fn register(
        &self,
        identity: Identity,
    ) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let (sender, receiver) = mpsc::channel(self.delivery_buffer);
        let id = cuid2::create_id();

        let handle = Arc::new(SessionHandle {
            id: id.clone(),
            identity,
            sender,
            joined: Mutex::new(HashSet::new()),
        });

        self.sessions.write().await.insert(id.clone(), handle);
        debug!(session = %id, "session registered");
        (id, receiver)
    }

    /// Remove a session and take it out of every group it had joined.
    /// Idempotent: a second call reports `SessionNotFound`, which callers
    /// treat as success.
    pub async fn unregister(&self, session_id: &str) -> Result<(), RegistryError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or(RegistryError::SessionNotFound)?;

        let joined: Vec<String> = handle.joined.lock().await.drain().collect();
        for team_id in joined {
            if let Some(group) = self.group(&team_id).await {
                group.members.lock().await.remove(session_id);
                self.drop_group_if_empty(&team_id).await;
            }
        }

        debug!(session = %session_id, "session unregistered");
        Ok(())
    }

    pub async fn session(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Snapshot of the groups a session has joined.
    pub async fn groups_of(&self, session_id: &str) -> Result<HashSet<String>, RegistryError> {
        let handle = self
            .session(session_id)
            .await
            .ok_or(RegistryError::SessionNotFound)?;
        let joined = handle.joined.lock().await.clone();
        Ok(joined)
    }

    /// Snapshot of the sessions currently in a team group, reflecting the
    /// latest join/leave state at call time.
    pub async fn sessions_in(&self, team_id: &str) -> Vec<SessionId> {
        match self.group(team_id).await {
            Some(group) => group.members.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub(crate) async fn handles_in(&self, team_id: &str) -> Vec<Arc<SessionHandle>> {
        let ids = self.sessions_in(team_id).await;
        let sessions = self.sessions.read().await;
        ids.iter()
            .filter_map(|id| sessions.get(id).cloned())
            .collect()
    }

    pub(crate) async fn group(&self, team_id: &str) -> Option<Arc<TeamGroup>> {
        self.groups.read().await.get(team_id).cloned()
    }

    pub(crate) async fn ensure_group(&self, team_id: &str) -> Arc<TeamGroup> {
        if let Some(group) = self.group(team_id).await {
            return group;
        }
        let mut groups = self.groups.write().await;
        groups
            .entry(team_id.to_owned())
            .or_insert_with(|| {
                Arc::new(TeamGroup {
                    members: Mutex::new(HashSet::new()),
                    publish_lock: Mutex::new(()),
                })
            })
            .clone()
    }

    pub(crate) async fn add_to_group(&self, handle: &Arc<SessionHandle>, team_id: &str) {
        let group = self.ensure_group(team_id).await;
        group.members.lock().await.insert(handle.id.clone());
        handle.joined.lock().await.insert(team_id.to_owned());
    }

    /// Returns whether the session was actually in the group.
    pub(crate) async fn remove_from_group(&self, handle: &SessionHandle, team_id: &str) -> bool {
        handle.joined.lock().await.remove(team_id);

        let removed = match self.group(team_id).await {
            Some(group) => group.members.lock().await.remove(handle.id()),
            None => false,
        };
        if removed {
            self.drop_group_if_empty(team_id).await;
        }
        removed
    }

    /// Take a whole group out of the registry, clearing the membership of
    /// every session in it. Used by the team-deletion path.
    pub(crate) async fn take_group_members(&self, team_id: &str) -> Vec<Arc<SessionHandle>> {
        let group = match self.groups.write().await.remove(team_id) {
            Some(group) => group,
            None => return Vec::new(),
        };

        let ids: Vec<SessionId> = group.members.lock().await.drain().collect();
        let mut handles = Vec::with_capacity(ids.len());
        {
            let sessions = self.sessions.read().await;
            for id in &ids {
                if let Some(handle) = sessions.get(id) {
                    handles.push(handle.clone());
                }
            }
        }
        for handle in &handles {
            handle.joined.lock().await.remove(team_id);
        }
        handles
    }

    async fn drop_group_if_empty(&self, team_id: &str) {
        let mut groups = self.groups.write().await;
        let empty = match groups.get(team_id) {
            Some(group) => group.members.lock().await.is_empty(),
            None => false,
        };
        if empty {
            groups.remove(team_id);
            debug!(team = %team_id, "empty group dropped");
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
