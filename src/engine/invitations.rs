//! The invitation ledger operations.

use crate::db::{DbError, Invitation, User, channels, invitations, memberships, users};
use crate::error::{OpError, OpResult};
use crate::state::{ConnId, Hub};
use parlor_proto::{ChannelType, InvitationPayload, ResolutionStatus, ServerEvent};
use tracing::info;

/// How the invitee is addressed.
#[derive(Debug, Clone)]
pub enum InviteeRef {
    Id(String),
    Nickname(String),
}

/// Invite a user into a channel.
///
/// An invitation always supersedes a prior ban: any standing ban for
/// the invitee on this channel is cleared in the same transaction.
pub async fn invite(
    hub: &Hub,
    inviter: &User,
    channel_id: &str,
    invitee: InviteeRef,
) -> OpResult<InvitationPayload> {
    let mut tx = hub.db.begin().await?;

    let channel = channels::find_active_by_id(&mut tx, channel_id)
        .await?
        .ok_or(OpError::NotFound("channel"))?;

    let invited_user = match &invitee {
        InviteeRef::Id(id) => users::find_by_id(&mut tx, id).await?,
        InviteeRef::Nickname(nickname) => users::find_by_nickname(&mut tx, nickname).await?,
    }
    .ok_or(OpError::NotFound("user"))?;

    if inviter.id == invited_user.id {
        return Err(OpError::SelfInvite);
    }
    if channel.channel_type == ChannelType::Private && inviter.id != channel.administrator_id {
        return Err(OpError::PermissionDenied);
    }
    if memberships::is_member(&mut tx, &invited_user.id, &channel.id).await? {
        return Err(OpError::AlreadyMember);
    }

    memberships::clear_ban(&mut tx, &invited_user.id, &channel.id).await?;

    if invitations::find_pending(&mut tx, &invited_user.id, &channel.id)
        .await?
        .is_some()
    {
        return Err(OpError::AlreadyInvited);
    }

    let invitation = invitations::create(&mut tx, &invited_user.id, &inviter.id, &channel.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    let mut payload = invitation.payload();
    payload.invited_by = Some(inviter.summary());
    payload.channel = Some(channel.summary());

    hub.fanout.send_to_user(
        &invited_user.id,
        ServerEvent::InvitationReceive {
            invitation: payload.clone(),
        },
    );

    info!(
        channel = %channel.name,
        inviter = %inviter.nickname,
        invitee = %invited_user.nickname,
        "Invitation created"
    );
    Ok(payload)
}

/// Accept or decline an invitation. Either way the ledger row goes
/// away; only accept touches membership.
pub async fn resolve(
    hub: &Hub,
    acting: &User,
    invitation_id: &str,
    status: ResolutionStatus,
    origin: Option<ConnId>,
) -> OpResult<Invitation> {
    let mut tx = hub.db.begin().await?;

    let invitation = invitations::find_by_id(&mut tx, invitation_id)
        .await?
        .ok_or(OpError::NotFound("invitation"))?;

    if invitation.user_id != acting.id {
        return Err(OpError::NotInvitee);
    }

    if status == ResolutionStatus::Accept {
        let channel = channels::find_active_by_id(&mut tx, &invitation.channel_id)
            .await?
            .ok_or_else(|| OpError::InvalidState("channel no longer exists".into()))?;

        // A ban that landed after the invite still loses to it: a user
        // is never a member and banned at once.
        memberships::clear_ban(&mut tx, &acting.id, &channel.id).await?;

        if !memberships::is_member(&mut tx, &acting.id, &channel.id).await? {
            memberships::add_member(&mut tx, &acting.id, &channel.id).await?;
        }
    }

    invitations::delete(&mut tx, &invitation.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    hub.fanout.send_to_user_skip(
        &acting.id,
        ServerEvent::InvitationResolve {
            invitation: invitation.payload(),
            status,
        },
        origin,
    );

    info!(
        invitation = %invitation.id,
        user = %acting.nickname,
        status = %status,
        "Invitation resolved"
    );
    Ok(invitation)
}

/// Withdraw a pending invitation. The original inviter or the
/// channel's administrator may cancel; nobody else.
pub async fn cancel(hub: &Hub, acting: &User, invitation_id: &str) -> OpResult<()> {
    let mut tx = hub.db.begin().await?;

    let invitation = invitations::find_by_id(&mut tx, invitation_id)
        .await?
        .ok_or(OpError::NotFound("invitation"))?;

    let channel = channels::find_by_id(&mut tx, &invitation.channel_id)
        .await?
        .ok_or(OpError::NotFound("channel"))?;

    if invitation.invited_by_id != acting.id && channel.administrator_id != acting.id {
        return Err(OpError::PermissionDenied);
    }

    invitations::delete(&mut tx, &invitation.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    info!(invitation = %invitation.id, user = %acting.nickname, "Invitation cancelled");
    Ok(())
}

/// A user's unresolved invitations, split into the ones they sent and
/// the ones they received, both newest first.
pub async fn list_for_user(
    hub: &Hub,
    user: &User,
) -> OpResult<(Vec<InvitationPayload>, Vec<InvitationPayload>)> {
    let mut conn = hub.db.conn().await?;

    let sent = invitations::sent_by(&mut conn, &user.id).await?;
    let received = invitations::received_by(&mut conn, &user.id).await?;

    let mut received_payloads = Vec::with_capacity(received.len());
    for invitation in &received {
        let mut payload = invitation.payload();
        if let Some(inviter) = users::find_by_id(&mut conn, &invitation.invited_by_id).await? {
            payload.invited_by = Some(inviter.summary());
        }
        if let Some(channel) = channels::find_by_id(&mut conn, &invitation.channel_id).await? {
            payload.channel = Some(channel.summary());
        }
        received_payloads.push(payload);
    }

    Ok((
        sent.iter().map(Invitation::payload).collect(),
        received_payloads,
    ))
}
