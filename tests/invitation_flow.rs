//! Invitations: creation rules, resolution, ban clearing, cancellation.

mod common;

use common::{register, test_hub};
use parlor::db::memberships;
use parlor::engine::channels;
use parlor::engine::invitations::{self, InviteeRef};
use parlor::error::OpError;
use parlor_proto::{ChannelType, ResolutionStatus};

#[tokio::test]
async fn accept_makes_the_invitee_a_member() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    let invitation = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();

    invitations::resolve(&hub, &bob, &invitation.id, ResolutionStatus::Accept, None)
        .await
        .unwrap();

    let mut conn = hub.db.conn().await.unwrap();
    assert!(memberships::is_member(&mut conn, &bob.id, &channel.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn decline_leaves_no_trace() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    let invitation = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();

    invitations::resolve(&hub, &bob, &invitation.id, ResolutionStatus::Decline, None)
        .await
        .unwrap();

    let mut conn = hub.db.conn().await.unwrap();
    assert!(!memberships::is_member(&mut conn, &bob.id, &channel.id)
        .await
        .unwrap());
    drop(conn);

    // The slot is free again.
    invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();
}

#[tokio::test]
async fn invitee_can_be_addressed_by_nickname() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    let invitation = invitations::invite(
        &hub,
        &ada,
        &channel.id,
        InviteeRef::Nickname("BOB".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(invitation.user_id, bob.id);
}

#[tokio::test]
async fn private_channel_invites_are_admin_only() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;
    let eve = register(&hub, "eve").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    let invitation = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();
    invitations::resolve(&hub, &bob, &invitation.id, ResolutionStatus::Accept, None)
        .await
        .unwrap();

    let err = invitations::invite(&hub, &bob, &channel.id, InviteeRef::Id(eve.id.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));
}

#[tokio::test]
async fn any_member_invites_to_a_public_channel() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;
    let eve = register(&hub, "eve").await;

    let channel = channels::create(&hub, &ada, "general", ChannelType::Public)
        .await
        .unwrap();
    channels::join(&hub, &bob, "general").await.unwrap();

    invitations::invite(&hub, &bob, &channel.id, InviteeRef::Id(eve.id.clone()))
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_self_and_member_invites_are_rejected() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();

    let err = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(ada.id.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::SelfInvite));

    invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();
    let err = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::AlreadyInvited));

    let err = invitations::invite(
        &hub,
        &ada,
        &channel.id,
        InviteeRef::Nickname("ada".to_string()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OpError::SelfInvite));
}

#[tokio::test]
async fn inviting_a_banned_user_clears_the_ban() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "general", ChannelType::Public)
        .await
        .unwrap();
    let mut conn = hub.db.conn().await.unwrap();
    memberships::ban(&mut conn, &bob.id, &channel.id).await.unwrap();
    drop(conn);

    let err = channels::join(&hub, &bob, "general").await.unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));

    let invitation = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();

    let mut conn = hub.db.conn().await.unwrap();
    assert!(!memberships::is_banned(&mut conn, &bob.id, &channel.id)
        .await
        .unwrap());
    drop(conn);

    invitations::resolve(&hub, &bob, &invitation.id, ResolutionStatus::Accept, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn only_the_invitee_resolves() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;
    let eve = register(&hub, "eve").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    let invitation = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();

    let err = invitations::resolve(&hub, &eve, &invitation.id, ResolutionStatus::Accept, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::NotInvitee));
}

#[tokio::test]
async fn accepting_into_a_deleted_channel_fails() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    let invitation = invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();
    channels::destroy(&hub, &ada, &channel.id).await.unwrap();

    let err = invitations::resolve(&hub, &bob, &invitation.id, ResolutionStatus::Accept, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::InvalidState(_)));
}

#[tokio::test]
async fn cancellation_is_for_inviter_or_administrator() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;
    let eve = register(&hub, "eve").await;

    let channel = channels::create(&hub, &ada, "general", ChannelType::Public)
        .await
        .unwrap();
    channels::join(&hub, &bob, "general").await.unwrap();

    // Inviter withdraws their own invitation.
    let invitation = invitations::invite(&hub, &bob, &channel.id, InviteeRef::Id(eve.id.clone()))
        .await
        .unwrap();
    invitations::cancel(&hub, &bob, &invitation.id).await.unwrap();

    // The administrator may withdraw anyone's.
    let invitation = invitations::invite(&hub, &bob, &channel.id, InviteeRef::Id(eve.id.clone()))
        .await
        .unwrap();
    invitations::cancel(&hub, &ada, &invitation.id).await.unwrap();

    // The invitee resolves, they do not cancel.
    let invitation = invitations::invite(&hub, &bob, &channel.id, InviteeRef::Id(eve.id.clone()))
        .await
        .unwrap();
    let err = invitations::cancel(&hub, &eve, &invitation.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OpError::PermissionDenied));
}

#[tokio::test]
async fn listing_splits_sent_and_received() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;
    let bob = register(&hub, "bob").await;

    let channel = channels::create(&hub, &ada, "cabal", ChannelType::Private)
        .await
        .unwrap();
    invitations::invite(&hub, &ada, &channel.id, InviteeRef::Id(bob.id.clone()))
        .await
        .unwrap();

    let (sent, received) = invitations::list_for_user(&hub, &ada).await.unwrap();
    assert_eq!(sent.len(), 1);
    assert!(received.is_empty());

    let (sent, received) = invitations::list_for_user(&hub, &bob).await.unwrap();
    assert!(sent.is_empty());
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].channel.as_ref().map(|c| c.name.as_str()),
        Some("cabal")
    );
}
