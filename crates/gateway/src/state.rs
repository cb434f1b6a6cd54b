//! Shared application state for the gateway

use std::sync::Arc;

use huddle_auth::Authenticator;
use huddle_config::{AppConfig, RealtimeConfig};
use huddle_realtime::{ConnectionRegistry, FanoutEngine, GroupManager};
use huddle_teams::{
    InvitationService, MembershipRepository, MembershipService, MessageRepository,
};
use sqlx::SqlitePool;

/// Everything a request handler needs: the domain services, the
/// authenticator and the realtime hub.
#[derive(Clone)]
pub struct GatewayState {
    pub pool: SqlitePool,
    pub authenticator: Authenticator,
    pub memberships: MembershipService,
    pub invitations: InvitationService,
    pub messages: MessageRepository,
    pub registry: Arc<ConnectionRegistry>,
    pub groups: Arc<GroupManager>,
    pub fanout: Arc<FanoutEngine>,
    pub realtime: RealtimeConfig,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator, config: &AppConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.realtime.delivery_buffer));
        let groups = Arc::new(GroupManager::new(
            registry.clone(),
            MembershipRepository::new(pool.clone()),
        ));
        let fanout = Arc::new(FanoutEngine::new(
            registry.clone(),
            MessageRepository::new(pool.clone()),
        ));

        Self {
            authenticator,
            memberships: MembershipService::new(pool.clone()),
            invitations: InvitationService::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            registry,
            groups,
            fanout,
            realtime: config.realtime.clone(),
            pool,
        }
    }
}
