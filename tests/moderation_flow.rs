//! Kicks, revokes and the ban escalation ladder.

mod common;

use common::{register, test_hub};
use parlor::db::{User, memberships};
use parlor::engine::channels;
use parlor::engine::invitations::{self, InviteeRef};
use parlor::engine::moderation;
use parlor::error::OpError;
use parlor::state::Hub;
use parlor_proto::{ChannelType, ModerationMethod, ResolutionStatus};

/// Public channel with the given members; the first one administers.
async fn setup(hub: &Hub, nicknames: &[&str]) -> (Vec<User>, String) {
    let mut members = Vec::new();
    for nickname in nicknames {
        members.push(register(hub, nickname).await);
    }
    let channel = channels::create(hub, &members[0], "arena", ChannelType::Public)
        .await
        .unwrap();
    for member in &members[1..] {
        channels::join(hub, member, "arena").await.unwrap();
    }
    (members, channel.id)
}

#[tokio::test]
async fn one_kick_removes_but_does_not_ban() {
    let hub = test_hub().await;
    let (members, channel_id) = setup(&hub, &["ada", "bob", "eve"]).await;
    let (bob, eve) = (&members[1], &members[2]);

    let outcome = moderation::moderate(&hub, bob, "arena", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap();
    assert!(!outcome.banned);

    let mut conn = hub.db.conn().await.unwrap();
    assert!(!memberships::is_member(&mut conn, &eve.id, &channel_id)
        .await
        .unwrap());
    assert!(!memberships::is_banned(&mut conn, &eve.id, &channel_id)
        .await
        .unwrap());
    drop(conn);

    // Below the threshold the target can just rejoin.
    channels::join(&hub, eve, "arena").await.unwrap();
}

#[tokio::test]
async fn the_same_kicker_counts_once() {
    let hub = test_hub().await;
    let (members, _) = setup(&hub, &["ada", "bob", "eve"]).await;
    let (bob, eve) = (&members[1], &members[2]);

    moderation::moderate(&hub, bob, "arena", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap();
    channels::join(&hub, eve, "arena").await.unwrap();

    let err = moderation::moderate(&hub, bob, "arena", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::AlreadyKicked));
}

#[tokio::test]
async fn three_distinct_kickers_ban() {
    let hub = test_hub().await;
    let (members, channel_id) = setup(&hub, &["ada", "bob", "carol", "dave", "eve"]).await;
    let eve = &members[4];

    for (i, kicker) in members[1..4].iter().enumerate() {
        let outcome = moderation::moderate(&hub, kicker, "arena", &eve.id, ModerationMethod::Kick)
            .await
            .unwrap();
        if i < 2 {
            assert!(!outcome.banned);
            channels::join(&hub, eve, "arena").await.unwrap();
        } else {
            assert!(outcome.banned);
        }
    }

    let mut conn = hub.db.conn().await.unwrap();
    assert!(memberships::is_banned(&mut conn, &eve.id, &channel_id)
        .await
        .unwrap());
    // The tally resets once the ban lands.
    assert_eq!(
        memberships::count_distinct_kickers(&mut conn, &eve.id, &channel_id)
            .await
            .unwrap(),
        0
    );
    drop(conn);

    let err = channels::join(&hub, eve, "arena").await.unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));
}

#[tokio::test]
async fn an_invitation_restarts_the_ladder() {
    let hub = test_hub().await;
    let (members, channel_id) = setup(&hub, &["ada", "bob", "carol", "dave", "eve"]).await;
    let (ada, eve) = (&members[0], &members[4]);

    for kicker in &members[1..4] {
        let _ = moderation::moderate(&hub, kicker, "arena", &eve.id, ModerationMethod::Kick)
            .await
            .unwrap();
        if channels::join(&hub, eve, "arena").await.is_err() {
            break;
        }
    }

    let invitation = invitations::invite(&hub, ada, &channel_id, InviteeRef::Id(eve.id.clone()))
        .await
        .unwrap();
    invitations::resolve(&hub, eve, &invitation.id, ResolutionStatus::Accept, None)
        .await
        .unwrap();

    // Back in with a clean slate: the first kicker can vote again.
    let outcome = moderation::moderate(&hub, &members[1], "arena", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap();
    assert!(!outcome.banned);
}

#[tokio::test]
async fn the_administrator_kick_bans_outright() {
    let hub = test_hub().await;
    let (members, channel_id) = setup(&hub, &["ada", "eve"]).await;
    let (ada, eve) = (&members[0], &members[1]);

    let outcome = moderation::moderate(&hub, ada, "arena", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap();
    assert!(outcome.banned);

    let mut conn = hub.db.conn().await.unwrap();
    assert!(memberships::is_banned(&mut conn, &eve.id, &channel_id)
        .await
        .unwrap());
}

#[tokio::test]
async fn revoke_is_admin_only() {
    let hub = test_hub().await;
    let (members, _) = setup(&hub, &["ada", "bob", "eve"]).await;
    let (ada, bob, eve) = (&members[0], &members[1], &members[2]);

    let err = moderation::moderate(&hub, bob, "arena", &eve.id, ModerationMethod::Revoke)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));

    let outcome = moderation::moderate(&hub, ada, "arena", &eve.id, ModerationMethod::Revoke)
        .await
        .unwrap();
    assert!(outcome.banned);
}

#[tokio::test]
async fn private_channel_moderation_is_admin_only() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;
    let eve = register(&hub, "eve").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    for target in [&bob, &eve] {
        let invitation =
            invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(target.id.clone()))
                .await
                .unwrap();
        invitations::resolve(&hub, target, &invitation.id, ResolutionStatus::Accept, None)
            .await
            .unwrap();
    }

    let err = moderation::moderate(&hub, &bob, "cabal", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));

    let outcome = moderation::moderate(&hub, &ada, "cabal", &eve.id, ModerationMethod::Kick)
        .await
        .unwrap();
    assert!(outcome.banned);
}

#[tokio::test]
async fn the_untouchables() {
    let hub = test_hub().await;
    let (members, _) = setup(&hub, &["ada", "bob"]).await;
    let (ada, bob) = (&members[0], &members[1]);
    let outsider = register(&hub, "eve").await;

    // Nobody moderates themselves.
    let err = moderation::moderate(&hub, bob, "arena", &bob.id, ModerationMethod::Kick)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::SelfModeration));

    // Nobody touches the administrator.
    let err = moderation::moderate(&hub, bob, "arena", &ada.id, ModerationMethod::Kick)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));

    // Non-members neither kick nor get kicked.
    let err = moderation::moderate(&hub, &outsider, "arena", &bob.id, ModerationMethod::Kick)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::NotMember));
    let err = moderation::moderate(&hub, bob, "arena", &outsider.id, ModerationMethod::Kick)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::TargetNotMember));
}
