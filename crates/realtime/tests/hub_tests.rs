//! Integration tests for the registry, group manager and fanout engine.

use std::sync::Arc;

use chrono::Utc;
use huddle_auth::{Identity, UserRole};
use huddle_database::initialize_test_database;
use huddle_realtime::{
    ConnectionRegistry, FanoutEngine, GroupManager, RealtimeError, RegistryError, ServerEvent,
};
use huddle_teams::{MembershipRepository, MessageRepository, TeamRole};
use sqlx::SqlitePool;
use tokio::sync::mpsc;

async fn seed_user(pool: &SqlitePool, email: &str) -> (i64, String) {
    let now = Utc::now().to_rfc3339();
    let public_id = cuid2::create_id();
    sqlx::query(
        "INSERT INTO users (public_id, email, display_name, is_admin, created_at, updated_at) VALUES (?, ?, NULL, 0, ?, ?)",
    )
    .bind(&public_id)
    .bind(email)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("seed user");

    let id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE public_id = ?")
        .bind(&public_id)
        .fetch_one(pool)
        .await
        .expect("seeded user id");
    (id, public_id)
}

fn identity(user_id: i64, public_id: &str) -> Identity {
    Identity {
        user_id,
        public_id: public_id.to_owned(),
        role: UserRole::User,
    }
}

struct Hub {
    pool: SqlitePool,
    registry: Arc<ConnectionRegistry>,
    groups: GroupManager,
    fanout: FanoutEngine,
    memberships: MembershipRepository,
}

async fn hub() -> Hub {
    let pool = initialize_test_database().await.expect("test database");
    let registry = Arc::new(ConnectionRegistry::new(64));
    let memberships = MembershipRepository::new(pool.clone());
    let groups = GroupManager::new(registry.clone(), memberships.clone());
    let fanout = FanoutEngine::new(registry.clone(), MessageRepository::new(pool.clone()));
    Hub {
        pool,
        registry,
        groups,
        fanout,
        memberships,
    }
}

fn expect_message(rx: &mut mpsc::Receiver<ServerEvent>) -> String {
    match rx.try_recv().expect("event should be queued") {
        ServerEvent::Message { message } => message.content,
        other => panic!("expected message event, got {other:?}"),
    }
}

#[tokio::test]
async fn unregister_clears_every_joined_group() {
    let h = hub().await;
    let (user, user_pid) = seed_user(&h.pool, "a@example.com").await;
    let team_a = h.memberships.create_team("alpha", user).await.unwrap();
    let team_b = h.memberships.create_team("beta", user).await.unwrap();

    let (session, _rx) = h.registry.register(identity(user, &user_pid)).await;
    h.groups.join(&session, &team_a.public_id).await.unwrap();
    h.groups.join(&session, &team_b.public_id).await.unwrap();

    let joined = h.registry.groups_of(&session).await.unwrap();
    assert_eq!(joined.len(), 2);

    h.registry.unregister(&session).await.unwrap();

    assert!(h.registry.sessions_in(&team_a.public_id).await.is_empty());
    assert!(h.registry.sessions_in(&team_b.public_id).await.is_empty());

    // Disconnect races are benign: a second unregister signals
    // SessionNotFound instead of failing.
    assert_eq!(
        h.registry.unregister(&session).await,
        Err(RegistryError::SessionNotFound)
    );
    assert_eq!(
        h.registry.groups_of(&session).await,
        Err(RegistryError::SessionNotFound)
    );
}

#[tokio::test]
async fn join_revalidates_membership_at_call_time() {
    let h = hub().await;
    let (organizer, _) = seed_user(&h.pool, "org@example.com").await;
    let (member, member_pid) = seed_user(&h.pool, "member@example.com").await;
    let team = h.memberships.create_team("alpha", organizer).await.unwrap();
    h.memberships
        .add_membership(&team.public_id, member, TeamRole::Member)
        .await
        .unwrap();

    let (session, _rx) = h.registry.register(identity(member, &member_pid)).await;

    // Member at connect time is not enough: revoke before the join.
    h.memberships
        .remove_membership(&team.public_id, member)
        .await
        .unwrap();

    let err = h
        .groups
        .join(&session, &team.public_id)
        .await
        .expect_err("revoked member may not join");
    assert!(matches!(err, RealtimeError::Denied { .. }));
    assert!(h.registry.sessions_in(&team.public_id).await.is_empty());

    // Re-adding restores access without reconnecting.
    h.memberships
        .add_membership(&team.public_id, member, TeamRole::Member)
        .await
        .unwrap();
    h.groups.join(&session, &team.public_id).await.unwrap();
    assert_eq!(h.registry.sessions_in(&team.public_id).await.len(), 1);
}

#[tokio::test]
async fn leave_is_idempotent() {
    let h = hub().await;
    let (user, user_pid) = seed_user(&h.pool, "a@example.com").await;
    let team = h.memberships.create_team("alpha", user).await.unwrap();

    let (session, _rx) = h.registry.register(identity(user, &user_pid)).await;
    h.groups.join(&session, &team.public_id).await.unwrap();

    h.groups.leave(&session, &team.public_id).await.unwrap();
    h.groups.leave(&session, &team.public_id).await.unwrap();
    assert!(h.registry.sessions_in(&team.public_id).await.is_empty());
}

#[tokio::test]
async fn publish_requires_joined_not_just_member() {
    let h = hub().await;
    let (user, user_pid) = seed_user(&h.pool, "a@example.com").await;
    let team = h.memberships.create_team("alpha", user).await.unwrap();

    let (session, _rx) = h.registry.register(identity(user, &user_pid)).await;

    let err = h
        .fanout
        .publish(&session, &team.public_id, "hello")
        .await
        .expect_err("un-joined member may not publish");
    assert!(matches!(err, RealtimeError::Denied { .. }));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "denied publish must not persist anything");
}

#[tokio::test]
async fn publish_persists_then_delivers_to_current_group() {
    let h = hub().await;
    let (organizer, org_pid) = seed_user(&h.pool, "org@example.com").await;
    let (member, member_pid) = seed_user(&h.pool, "member@example.com").await;
    let team = h.memberships.create_team("alpha", organizer).await.unwrap();
    h.memberships
        .add_membership(&team.public_id, member, TeamRole::Member)
        .await
        .unwrap();

    let (org_session, mut org_rx) = h.registry.register(identity(organizer, &org_pid)).await;
    let (mem_session, mut mem_rx) = h.registry.register(identity(member, &member_pid)).await;
    h.groups.join(&org_session, &team.public_id).await.unwrap();
    h.groups.join(&mem_session, &team.public_id).await.unwrap();

    let record = h
        .fanout
        .publish(&mem_session, &team.public_id, "hello")
        .await
        .expect("publish");
    assert_eq!(record.content, "hello");
    assert_eq!(record.user_public_id, member_pid);

    // Persisted exactly once, before any delivery.
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE public_id = ?")
        .bind(&record.public_id)
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Both live sessions, publisher included, observe the message.
    assert_eq!(expect_message(&mut org_rx), "hello");
    assert_eq!(expect_message(&mut mem_rx), "hello");
}

#[tokio::test]
async fn per_team_order_is_observed_by_every_session() {
    let h = hub().await;
    let (organizer, org_pid) = seed_user(&h.pool, "org@example.com").await;
    let (member, member_pid) = seed_user(&h.pool, "member@example.com").await;
    let team = h.memberships.create_team("alpha", organizer).await.unwrap();
    h.memberships
        .add_membership(&team.public_id, member, TeamRole::Member)
        .await
        .unwrap();

    let (org_session, mut org_rx) = h.registry.register(identity(organizer, &org_pid)).await;
    let (mem_session, mut mem_rx) = h.registry.register(identity(member, &member_pid)).await;
    h.groups.join(&org_session, &team.public_id).await.unwrap();
    h.groups.join(&mem_session, &team.public_id).await.unwrap();

    let first = h
        .fanout
        .publish(&org_session, &team.public_id, "first")
        .await
        .unwrap();
    let second = h
        .fanout
        .publish(&org_session, &team.public_id, "second")
        .await
        .unwrap();
    assert!(first.id < second.id, "persisted order follows publish order");

    for rx in [&mut org_rx, &mut mem_rx] {
        assert_eq!(expect_message(rx), "first");
        assert_eq!(expect_message(rx), "second");
    }
}

#[tokio::test]
async fn force_leave_covers_every_session_of_the_user() {
    let h = hub().await;
    let (organizer, org_pid) = seed_user(&h.pool, "org@example.com").await;
    let (member, member_pid) = seed_user(&h.pool, "member@example.com").await;
    let team = h.memberships.create_team("alpha", organizer).await.unwrap();
    h.memberships
        .add_membership(&team.public_id, member, TeamRole::Member)
        .await
        .unwrap();

    // The same user connected twice, plus the organizer.
    let (first, mut first_rx) = h.registry.register(identity(member, &member_pid)).await;
    let (second, mut second_rx) = h.registry.register(identity(member, &member_pid)).await;
    let (org_session, _org_rx) = h.registry.register(identity(organizer, &org_pid)).await;
    h.groups.join(&first, &team.public_id).await.unwrap();
    h.groups.join(&second, &team.public_id).await.unwrap();
    h.groups.join(&org_session, &team.public_id).await.unwrap();

    h.memberships
        .remove_membership(&team.public_id, member)
        .await
        .unwrap();
    h.groups.force_leave(&team.public_id, member).await;

    for rx in [&mut first_rx, &mut second_rx] {
        match rx.try_recv().expect("forced leave notification") {
            ServerEvent::ForcedLeave { team_id } => assert_eq!(team_id, team.public_id),
            other => panic!("expected forced_leave, got {other:?}"),
        }
    }

    let remaining = h.registry.sessions_in(&team.public_id).await;
    assert_eq!(remaining, vec![org_session.clone()]);

    // The evicted sessions can no longer publish.
    let err = h
        .fanout
        .publish(&first, &team.public_id, "after eviction")
        .await
        .expect_err("evicted session may not publish");
    assert!(matches!(err, RealtimeError::Denied { .. }));

    // Repeating the force-leave is a no-op.
    h.groups.force_leave(&team.public_id, member).await;
}

#[tokio::test]
async fn disband_notifies_and_empties_the_group() {
    let h = hub().await;
    let (organizer, org_pid) = seed_user(&h.pool, "org@example.com").await;
    let team = h.memberships.create_team("alpha", organizer).await.unwrap();

    let (session, mut rx) = h.registry.register(identity(organizer, &org_pid)).await;
    h.groups.join(&session, &team.public_id).await.unwrap();

    h.groups.disband(&team.public_id).await;

    match rx.try_recv().expect("deletion notification") {
        ServerEvent::TeamDeleted { team_id } => assert_eq!(team_id, team.public_id),
        other => panic!("expected team_deleted, got {other:?}"),
    }
    assert!(h.registry.sessions_in(&team.public_id).await.is_empty());
    assert!(h.registry.groups_of(&session).await.unwrap().is_empty());

    // Disbanding an already-gone group is a no-op.
    h.groups.disband(&team.public_id).await;
}

#[tokio::test]
async fn operations_on_unknown_sessions_are_benign() {
    let h = hub().await;
    let (user, _pid) = seed_user(&h.pool, "a@example.com").await;
    let team = h.memberships.create_team("alpha", user).await.unwrap();

    let err = h
        .groups
        .join("missing-session", &team.public_id)
        .await
        .expect_err("unknown session");
    assert!(matches!(err, RealtimeError::SessionNotFound));

    let err = h
        .fanout
        .publish("missing-session", &team.public_id, "hi")
        .await
        .expect_err("unknown session");
    assert!(matches!(err, RealtimeError::SessionNotFound));
}
