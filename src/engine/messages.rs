//! Posting, history and typing relays.

use crate::db::{DbError, User, channels, memberships, messages, users};
use crate::error::{OpError, OpResult};
use crate::state::{ConnId, Hub};
use parlor_proto::{MessagePayload, ServerEvent};

/// Persist a message and relay it to everyone viewing the channel,
/// except the posting connection.
pub async fn post(
    hub: &Hub,
    author: &User,
    channel_name: &str,
    content: &str,
    tag_nicknames: &[String],
    origin: Option<ConnId>,
) -> OpResult<MessagePayload> {
    let mut tx = hub.db.begin().await?;

    let channel = channels::find_active_by_name(&mut tx, channel_name)
        .await?
        .ok_or(OpError::NotFound("channel"))?;
    if !memberships::is_member(&mut tx, &author.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }

    let message = messages::create(&mut tx, &channel.id, &author.id, content, tag_nicknames).await?;
    tx.commit().await.map_err(DbError::from)?;

    let mut payload = message.payload();
    payload.author = Some(author.summary());

    hub.fanout.send_to_channel(
        &channel.id,
        ServerEvent::Message {
            message: payload.clone(),
        },
        origin,
    );
    Ok(payload)
}

/// One page of a channel's history, newest first. Members only.
pub async fn list(
    hub: &Hub,
    user: &User,
    channel_id: &str,
    page: i64,
    limit: i64,
) -> OpResult<Vec<MessagePayload>> {
    let mut conn = hub.db.conn().await?;

    let channel = channels::find_active_by_id(&mut conn, channel_id)
        .await?
        .ok_or(OpError::NotFound("channel"))?;
    if !memberships::is_member(&mut conn, &user.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }

    let rows = messages::list_page(&mut conn, &channel.id, page, limit).await?;

    let mut payloads = Vec::with_capacity(rows.len());
    for message in &rows {
        let mut payload = message.payload();
        if let Some(author) = users::find_by_id(&mut conn, &message.user_id).await? {
            payload.author = Some(author.summary());
        }
        payloads.push(payload);
    }
    Ok(payloads)
}

/// Relay a draft preview to the channel. Nothing is persisted.
pub async fn typing(
    hub: &Hub,
    user: &User,
    channel_name: &str,
    content: &str,
    origin: Option<ConnId>,
) -> OpResult<()> {
    let mut conn = hub.db.conn().await?;

    let channel = channels::find_active_by_name(&mut conn, channel_name)
        .await?
        .ok_or(OpError::NotFound("channel"))?;
    if !memberships::is_member(&mut conn, &user.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }
    drop(conn);

    hub.fanout.send_to_channel(
        &channel.id,
        ServerEvent::ReceiveTyping {
            author: user.summary(),
            channel: channel.name.clone(),
            content: content.to_string(),
        },
        origin,
    );
    Ok(())
}

/// A channel still exists and the user belongs to it. The socket
/// layer gates channel group entry on this.
pub async fn verify_membership(hub: &Hub, user: &User, channel_name: &str) -> OpResult<String> {
    let mut conn = hub.db.conn().await?;

    let channel = channels::find_active_by_name(&mut conn, channel_name)
        .await?
        .ok_or(OpError::NotFound("channel"))?;
    if !memberships::is_member(&mut conn, &user.id, &channel.id).await? {
        return Err(OpError::NotMember);
    }
    Ok(channel.id)
}
