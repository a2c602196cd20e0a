//! The WebSocket connection loop.
//!
//! One task per socket: it drains the fanout queue outward and
//! dispatches inbound commands to the engine. A rejected command
//! turns into an `error` event on this connection only; the socket
//! stays up.

use super::auth;
use crate::db::User;
use crate::engine::{activity, channels, invitations, messages, moderation};
use crate::error::{OpError, OpResult};
use crate::state::{ConnId, Hub};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use parlor_proto::{ClientCommand, ServerEvent};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

pub async fn upgrade(
    State(hub): State<Arc<Hub>>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    match auth::user_for_token(&hub, &params.token).await {
        Ok(user) => ws.on_upgrade(move |socket| run(socket, hub, user)),
        Err(err) => err.into_response(),
    }
}

async fn run(socket: WebSocket, hub: Arc<Hub>, user: User) {
    let conn = ConnId::next();
    let mut events = hub.fanout.register(conn, &user.id);

    if let Err(err) = activity::connect(&hub, conn, &user).await {
        warn!(conn = %conn, error = %err, "Presence registration failed");
        hub.fanout.unregister(conn, &user.id);
        return;
    }

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = events.recv() => {
                let Some(event) = outbound else { break };
                match serde_json::to_string(event.as_ref()) {
                    Ok(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(conn = %conn, error = %err, "Event serialization failed"),
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(err) = dispatch(&hub, &user, conn, &text).await {
                            reject(&hub, conn, &err);
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.fanout.unregister(conn, &user.id);
    if let Err(err) = activity::disconnect(&hub, conn).await {
        warn!(conn = %conn, error = %err, "Presence teardown failed");
    }
    debug!(conn = %conn, user = %user.nickname, "Socket closed");
}

/// Surface a rejection to the initiating connection only.
fn reject(hub: &Hub, conn: ConnId, err: &OpError) {
    let message = if let OpError::Db(inner) = err {
        tracing::error!(conn = %conn, error = %inner, "database error while handling command");
        "internal server error".to_string()
    } else {
        err.to_string()
    };
    hub.fanout.send_to_conn(
        conn,
        ServerEvent::Error {
            code: err.error_code().to_string(),
            message,
        },
    );
}

async fn dispatch(hub: &Hub, user: &User, conn: ConnId, text: &str) -> OpResult<()> {
    let command: ClientCommand = serde_json::from_str(text)
        .map_err(|e| OpError::InvalidState(format!("malformed command: {e}")))?;

    match command {
        ClientCommand::SetStatus { status } => {
            activity::set_status(hub, user, status, Some(conn));
        }
        ClientCommand::OpenChannel { channel } => {
            let channel_id = messages::verify_membership(hub, user, &channel).await?;
            hub.fanout.join_channel(conn, &channel_id);
        }
        ClientCommand::CloseChannel { channel } => {
            let channel_id = channels::resolve_id(hub, &channel).await?;
            hub.fanout.leave_channel(conn, &channel_id);
        }
        ClientCommand::SendMessage {
            channel,
            content,
            tags,
        } => {
            messages::post(hub, user, &channel, &content, &tags, Some(conn)).await?;
        }
        ClientCommand::Typing { channel, content } => {
            messages::typing(hub, user, &channel, &content, Some(conn)).await?;
        }
        ClientCommand::CreateInvitation {
            channel_id,
            user_id,
            nickname,
        } => {
            let invitee = match (user_id, nickname) {
                (Some(id), _) => invitations::InviteeRef::Id(id),
                (None, Some(nickname)) => invitations::InviteeRef::Nickname(nickname),
                (None, None) => {
                    return Err(OpError::InvalidState(
                        "an invitee id or nickname is required".into(),
                    ));
                }
            };
            invitations::invite(hub, user, &channel_id, invitee).await?;
        }
        ClientCommand::ResolveInvitation { id, status } => {
            invitations::resolve(hub, user, &id, status, Some(conn)).await?;
        }
        ClientCommand::CancelInvitation { id } => {
            invitations::cancel(hub, user, &id).await?;
        }
        ClientCommand::Moderate {
            channel,
            user_id,
            method,
        } => {
            moderation::moderate(hub, user, &channel, &user_id, method).await?;
        }
    }
    Ok(())
}
