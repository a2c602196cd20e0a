//! Connection-keyed presence registry.
//!
//! Presence is transient per-process state, never a database column:
//! a user is online while at least one of their sockets is up, and
//! their advertised status is whatever the latest connection set.

use super::ConnId;
use dashmap::DashMap;
use parlor_proto::UserStatus;
use std::collections::HashSet;

#[derive(Debug)]
struct UserPresence {
    conns: HashSet<ConnId>,
    status: UserStatus,
}

/// Tracks which users are reachable and under which status.
pub struct PresenceRegistry {
    users: DashMap<String, UserPresence>,
    conn_owner: DashMap<ConnId, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            conn_owner: DashMap::new(),
        }
    }

    /// Register a connection. Returns true if this is the user's first
    /// active connection (their `user:online` moment).
    pub fn connect(&self, conn: ConnId, user_id: &str) -> bool {
        self.conn_owner.insert(conn, user_id.to_string());
        let mut entry = self.users.entry(user_id.to_string()).or_insert_with(|| {
            UserPresence {
                conns: HashSet::new(),
                status: UserStatus::Online,
            }
        });
        let first = entry.conns.is_empty();
        entry.conns.insert(conn);
        first
    }

    /// Drop a connection. Returns the owning user id and whether this
    /// was their last connection (their `user:offline` moment).
    pub fn disconnect(&self, conn: ConnId) -> Option<(String, bool)> {
        let (_, user_id) = self.conn_owner.remove(&conn)?;
        let mut last = false;
        if let Some(mut entry) = self.users.get_mut(&user_id) {
            entry.conns.remove(&conn);
            last = entry.conns.is_empty();
        }
        if last {
            self.users.remove(&user_id);
        }
        Some((user_id, last))
    }

    /// Update a user's advertised status across all their connections.
    pub fn set_status(&self, user_id: &str, status: UserStatus) {
        if let Some(mut entry) = self.users.get_mut(user_id) {
            entry.status = status;
        }
    }

    /// Current status of a user, if they have any connection up.
    pub fn status_of(&self, user_id: &str) -> Option<UserStatus> {
        self.users.get(user_id).map(|entry| entry.status)
    }

    /// Snapshot of present users other than `exclude_user`, as
    /// (user id, status) pairs.
    pub fn snapshot(&self, exclude_user: &str) -> Vec<(String, UserStatus)> {
        self.users
            .iter()
            .filter(|entry| entry.key() != exclude_user)
            .map(|entry| (entry.key().clone(), entry.value().status))
            .collect()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
