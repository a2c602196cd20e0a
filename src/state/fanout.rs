//! Socket fanout: personal rooms and channel groups.
//!
//! Every connection registers an mpsc sender; rooms are just sets of
//! connection ids. A user's personal room spans all their sockets.
//! Channel groups hold only the connections currently viewing that
//! channel, and joining one is gated on membership by the caller.

use super::ConnId;
use dashmap::DashMap;
use parlor_proto::ServerEvent;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outbound queue depth per connection. A connection that cannot keep
/// up gets events dropped, never blocks the sender.
const CONN_QUEUE: usize = 256;

pub struct Fanout {
    conns: DashMap<ConnId, mpsc::Sender<Arc<ServerEvent>>>,
    user_rooms: DashMap<String, HashSet<ConnId>>,
    channel_rooms: DashMap<String, HashSet<ConnId>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            user_rooms: DashMap::new(),
            channel_rooms: DashMap::new(),
        }
    }

    /// Register a connection and place it in its user's personal room.
    /// Returns the receiving half the connection task drains.
    pub fn register(&self, conn: ConnId, user_id: &str) -> mpsc::Receiver<Arc<ServerEvent>> {
        let (tx, rx) = mpsc::channel(CONN_QUEUE);
        self.conns.insert(conn, tx);
        self.user_rooms
            .entry(user_id.to_string())
            .or_default()
            .insert(conn);
        rx
    }

    /// Remove a connection from every room.
    pub fn unregister(&self, conn: ConnId, user_id: &str) {
        self.conns.remove(&conn);
        if let Some(mut room) = self.user_rooms.get_mut(user_id) {
            room.remove(&conn);
        }
        self.user_rooms.retain(|_, room| !room.is_empty());
        for mut room in self.channel_rooms.iter_mut() {
            room.value_mut().remove(&conn);
        }
        self.channel_rooms.retain(|_, room| !room.is_empty());
    }

    /// Add a connection to a channel's group.
    pub fn join_channel(&self, conn: ConnId, channel_id: &str) {
        self.channel_rooms
            .entry(channel_id.to_string())
            .or_default()
            .insert(conn);
    }

    /// Remove a connection from a channel's group.
    pub fn leave_channel(&self, conn: ConnId, channel_id: &str) {
        if let Some(mut room) = self.channel_rooms.get_mut(channel_id) {
            room.remove(&conn);
        }
    }

    /// Tear down a channel's group entirely (channel deleted).
    pub fn drop_channel_room(&self, channel_id: &str) {
        self.channel_rooms.remove(channel_id);
    }

    /// Eject every socket of one user from a channel's group (the
    /// user lost membership through kick, revoke or leave).
    pub fn eject_user_from_channel(&self, user_id: &str, channel_id: &str) {
        let conns = Self::room_conns(self.user_rooms.get(user_id));
        if let Some(mut room) = self.channel_rooms.get_mut(channel_id) {
            for conn in conns {
                room.remove(&conn);
            }
        }
    }

    fn deliver(&self, conn: ConnId, event: &Arc<ServerEvent>) {
        if let Some(tx) = self.conns.get(&conn) {
            // try_send: a slow consumer loses events, the fanout never stalls.
            let _ = tx.try_send(Arc::clone(event));
        }
    }

    fn room_conns(room: Option<dashmap::mapref::one::Ref<'_, String, HashSet<ConnId>>>) -> Vec<ConnId> {
        room.map(|r| r.iter().copied().collect()).unwrap_or_default()
    }

    /// Deliver to one connection only.
    pub fn send_to_conn(&self, conn: ConnId, event: ServerEvent) {
        self.deliver(conn, &Arc::new(event));
    }

    /// Deliver to every socket of one user.
    pub fn send_to_user(&self, user_id: &str, event: ServerEvent) {
        self.send_to_user_skip(user_id, event, None);
    }

    /// Deliver to every socket of one user except `skip`.
    pub fn send_to_user_skip(&self, user_id: &str, event: ServerEvent, skip: Option<ConnId>) {
        let event = Arc::new(event);
        for conn in Self::room_conns(self.user_rooms.get(user_id)) {
            if Some(conn) == skip {
                continue;
            }
            self.deliver(conn, &event);
        }
    }

    /// Deliver to every connection with the channel's group open,
    /// optionally skipping the originating connection.
    pub fn send_to_channel(&self, channel_id: &str, event: ServerEvent, skip: Option<ConnId>) {
        let event = Arc::new(event);
        for conn in Self::room_conns(self.channel_rooms.get(channel_id)) {
            if Some(conn) == skip {
                continue;
            }
            self.deliver(conn, &event);
        }
    }

    /// Deliver to every registered connection, optionally skipping one.
    pub fn broadcast_all(&self, event: ServerEvent, skip: Option<ConnId>) {
        let event = Arc::new(event);
        for entry in self.conns.iter() {
            if Some(*entry.key()) == skip {
                continue;
            }
            let _ = entry.value().try_send(Arc::clone(&event));
        }
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}
