//! Presence transitions and their notifications.

use crate::db::{User, users};
use crate::error::OpResult;
use crate::state::{ConnId, Hub};
use parlor_proto::{ServerEvent, UserStatus};
use tracing::debug;

/// A connection came up. Announces `user:online` when it is the
/// user's first socket and hands the fresh connection a presence
/// snapshot of everyone else.
pub async fn connect(hub: &Hub, conn: ConnId, user: &User) -> OpResult<()> {
    let first = hub.presence.connect(conn, &user.id);

    if first {
        hub.fanout.broadcast_all(
            ServerEvent::UserOnline {
                user: user.summary(),
            },
            Some(conn),
        );
    }

    let snapshot = hub.presence.snapshot(&user.id);
    let ids: Vec<String> = snapshot.iter().map(|(id, _)| id.clone()).collect();

    let mut db_conn = hub.db.conn().await?;
    let present = users::find_many(&mut db_conn, &ids).await?;
    drop(db_conn);

    let mut online = Vec::new();
    let mut dnd = Vec::new();
    for other in &present {
        let status = snapshot
            .iter()
            .find(|(id, _)| id == &other.id)
            .map(|(_, status)| *status)
            .unwrap_or(UserStatus::Online);
        match status {
            UserStatus::Dnd => dnd.push(other.summary()),
            // OFFLINE never appears in the registry; treat it as online.
            UserStatus::Online | UserStatus::Offline => online.push(other.summary()),
        }
    }

    hub.fanout
        .send_to_conn(conn, ServerEvent::UserList { online, dnd });

    debug!(conn = %conn, user = %user.nickname, first, "Connection registered");
    Ok(())
}

/// A connection went away. Announces `user:offline` when it was the
/// user's last socket.
pub async fn disconnect(hub: &Hub, conn: ConnId) -> OpResult<()> {
    let Some((user_id, last)) = hub.presence.disconnect(conn) else {
        return Ok(());
    };

    if last {
        let mut db_conn = hub.db.conn().await?;
        let user = users::find_by_id(&mut db_conn, &user_id).await?;
        drop(db_conn);

        if let Some(user) = user {
            hub.fanout.broadcast_all(
                ServerEvent::UserOffline {
                    user: user.summary(),
                },
                None,
            );
        }
    }

    debug!(conn = %conn, user = %user_id, last, "Connection dropped");
    Ok(())
}

/// A user changed their advertised status. Every other connection
/// hears about it, including the user's own other sockets.
pub fn set_status(hub: &Hub, user: &User, status: UserStatus, origin: Option<ConnId>) {
    hub.presence.set_status(&user.id, status);
    hub.fanout.broadcast_all(
        ServerEvent::ReceiveStatus {
            user_id: user.id.clone(),
            status,
        },
        origin,
    );
}
