//! Channel lifecycle: create, destroy, join, leave, listing.

use crate::db::{Channel, DbError, Page, User, channels, memberships, users};
use crate::error::{OpError, OpResult};
use crate::state::Hub;
use parlor_proto::{ChannelType, ServerEvent, UserSummary};
use tracing::info;

/// Create a channel. The creator becomes administrator and first
/// member in the same transaction.
pub async fn create(
    hub: &Hub,
    admin: &User,
    name: &str,
    channel_type: ChannelType,
) -> OpResult<Channel> {
    let mut tx = hub.db.begin().await?;

    if channels::find_active_by_name(&mut tx, name).await?.is_some() {
        return Err(OpError::NameTaken(name.to_string()));
    }

    let channel = channels::create(&mut tx, name, channel_type, &admin.id).await?;
    memberships::add_member(&mut tx, &admin.id, &channel.id).await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(
        channel = %channel.name,
        kind = %channel.channel_type,
        admin = %admin.nickname,
        "Channel created"
    );
    Ok(channel)
}

/// Soft-delete a channel. Administrator only.
pub async fn destroy(hub: &Hub, requester: &User, channel_id: &str) -> OpResult<()> {
    let mut tx = hub.db.begin().await?;

    let channel = channels::find_active_by_id(&mut tx, channel_id)
        .await?
        .ok_or(OpError::NotFound("channel"))?;

    if channel.administrator_id != requester.id {
        return Err(OpError::PermissionDenied);
    }

    channels::soft_delete(&mut tx, &channel.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    announce_deleted(hub, &channel);
    info!(channel = %channel.name, admin = %requester.nickname, "Channel destroyed");
    Ok(())
}

/// Join a public channel by name. Banned users are refused until a
/// fresh invitation clears the ban.
pub async fn join(hub: &Hub, user: &User, name: &str) -> OpResult<Channel> {
    let mut tx = hub.db.begin().await?;

    let channel = channels::find_active_by_name(&mut tx, name)
        .await?
        .ok_or(OpError::NotFound("channel"))?;

    if channel.channel_type != ChannelType::Public {
        return Err(OpError::PermissionDenied);
    }
    if memberships::is_banned(&mut tx, &user.id, &channel.id).await? {
        return Err(OpError::PermissionDenied);
    }

    memberships::add_member(&mut tx, &user.id, &channel.id).await?;
    tx.commit().await.map_err(DbError::from)?;

    info!(channel = %channel.name, user = %user.nickname, "User joined channel");
    Ok(channel)
}

/// Leave a channel. The administrator leaving deletes the channel for
/// everyone; any other member just drops out.
pub async fn leave(hub: &Hub, user: &User, channel_id: &str) -> OpResult<()> {
    let mut tx = hub.db.begin().await?;

    let channel = channels::find_active_by_id(&mut tx, channel_id)
        .await?
        .ok_or(OpError::NotFound("channel"))?;

    if !memberships::is_member(&mut tx, &user.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }

    let cascade = channel.administrator_id == user.id;
    if cascade {
        channels::soft_delete(&mut tx, &channel.id).await?;
    } else {
        memberships::remove_member(&mut tx, &user.id, &channel.id).await?;
    }
    tx.commit().await.map_err(DbError::from)?;

    if cascade {
        announce_deleted(hub, &channel);
        info!(channel = %channel.name, "Administrator left, channel deleted");
    } else {
        hub.fanout.send_to_channel(
            &channel.id,
            ServerEvent::ChannelLeave {
                user_id: user.id.clone(),
                channel_name: channel.name.clone(),
            },
            None,
        );
        hub.fanout.eject_user_from_channel(&user.id, &channel.id);
        info!(channel = %channel.name, user = %user.nickname, "User left channel");
    }
    Ok(())
}

/// Page through live public channels the user could join.
pub async fn list_public(
    hub: &Hub,
    user: &User,
    page: i64,
    limit: i64,
) -> OpResult<Page<Channel>> {
    let mut conn = hub.db.conn().await?;
    Ok(channels::list_public(&mut conn, &user.id, page, limit).await?)
}

/// Channels the user currently belongs to.
pub async fn list_joined(hub: &Hub, user: &User) -> OpResult<Vec<Channel>> {
    let mut conn = hub.db.conn().await?;
    let ids = memberships::channel_ids_of(&mut conn, &user.id).await?;
    let mut joined = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(channel) = channels::find_active_by_id(&mut conn, &id).await? {
            joined.push(channel);
        }
    }
    Ok(joined)
}

/// Member roster of a channel. Members only.
pub async fn members(hub: &Hub, user: &User, channel_id: &str) -> OpResult<Vec<UserSummary>> {
    let mut conn = hub.db.conn().await?;

    let channel = channels::find_active_by_id(&mut conn, channel_id)
        .await?
        .ok_or(OpError::NotFound("channel"))?;
    if !memberships::is_member(&mut conn, &user.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }

    let ids = memberships::member_ids_of(&mut conn, &channel.id).await?;
    let members = users::find_many(&mut conn, &ids).await?;
    Ok(members.iter().map(User::summary).collect())
}

/// Channel id for a live channel name.
pub async fn resolve_id(hub: &Hub, name: &str) -> OpResult<String> {
    let mut conn = hub.db.conn().await?;
    let channel = channels::find_active_by_name(&mut conn, name)
        .await?
        .ok_or(OpError::NotFound("channel"))?;
    Ok(channel.id)
}

/// Tell the channel's viewers it is gone and tear the group down.
pub(crate) fn announce_deleted(hub: &Hub, channel: &Channel) {
    hub.fanout.send_to_channel(
        &channel.id,
        ServerEvent::ChannelDelete {
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
        },
        None,
    );
    hub.fanout.drop_channel_room(&channel.id);
}
