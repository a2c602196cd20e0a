//! Kicks, revokes and the ban escalation ladder.

use crate::db::{DbError, User, channels, memberships, users};
use crate::error::{OpError, OpResult};
use crate::state::Hub;
use parlor_proto::{ChannelType, ModerationMethod, ServerEvent};
use tracing::info;

/// Kicks from this many distinct members escalate to a ban.
pub const KICK_BAN_THRESHOLD: i64 = 3;

/// Outcome of a moderation action, reported back to the actor.
#[derive(Debug, Clone)]
pub struct ModerationOutcome {
    pub target_id: String,
    pub channel_id: String,
    pub banned: bool,
}

/// Kick or revoke a member.
///
/// An ordinary member's kick is one vote: the target loses membership
/// and the kick is recorded, and once kicks from three distinct
/// members stand, the target is banned. The administrator's kick, and
/// every revoke, bans outright. A ban clears the kick tally so a later
/// invitation restarts the target with a clean slate.
pub async fn moderate(
    hub: &Hub,
    actor: &User,
    channel_name: &str,
    target_id: &str,
    method: ModerationMethod,
) -> OpResult<ModerationOutcome> {
    if actor.id == target_id {
        return Err(OpError::SelfModeration);
    }

    let mut tx = hub.db.begin().await?;

    let channel = channels::find_active_by_name(&mut tx, channel_name)
        .await?
        .ok_or(OpError::NotFound("channel"))?;

    if !memberships::is_member(&mut tx, &actor.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }

    let actor_is_admin = channel.administrator_id == actor.id;

    if method == ModerationMethod::Revoke && !actor_is_admin {
        return Err(OpError::PermissionDenied);
    }
    // In private channels only the administrator moderates at all.
    if channel.channel_type == ChannelType::Private && !actor_is_admin {
        return Err(OpError::PermissionDenied);
    }

    let target = users::find_by_id(&mut tx, target_id)
        .await?
        .ok_or(OpError::NotFound("user"))?;

    if !memberships::is_member(&mut tx, &target.id, &channel.id).await? {
        return Err(OpError::TargetNotMember);
    }
    if target.id == channel.administrator_id {
        return Err(OpError::PermissionDenied);
    }

    let banned = if actor_is_admin {
        // Admin decisions are final, whichever method carried them.
        memberships::ban(&mut tx, &target.id, &channel.id).await?;
        memberships::clear_kicks(&mut tx, &target.id, &channel.id).await?;
        true
    } else {
        if memberships::was_kicked_by(&mut tx, &actor.id, &target.id, &channel.id).await? {
            return Err(OpError::AlreadyKicked);
        }
        memberships::record_kick(&mut tx, &actor.id, &target.id, &channel.id).await?;

        let kickers = memberships::count_distinct_kickers(&mut tx, &target.id, &channel.id).await?;
        if kickers >= KICK_BAN_THRESHOLD {
            memberships::ban(&mut tx, &target.id, &channel.id).await?;
            memberships::clear_kicks(&mut tx, &target.id, &channel.id).await?;
            true
        } else {
            false
        }
    };

    memberships::remove_member(&mut tx, &target.id, &channel.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    let event = ServerEvent::ReceiveKick {
        user_id: target.id.clone(),
        channel_name: channel.name.clone(),
        banned,
    };
    hub.fanout.send_to_user(&target.id, event.clone());
    hub.fanout.send_to_channel(&channel.id, event, None);
    hub.fanout.eject_user_from_channel(&target.id, &channel.id);

    info!(
        channel = %channel.name,
        actor = %actor.nickname,
        target = %target.nickname,
        method = %method,
        banned,
        "Moderation action applied"
    );

    Ok(ModerationOutcome {
        target_id: target.id,
        channel_id: channel.id.clone(),
        banned,
    })
}
