//! In-process shared state.
//!
//! Everything that lives outside the database: the presence registry,
//! the socket fanout tables, and the session-token map. One `Hub` is
//! created at startup and handed around as `Arc<Hub>`.

pub mod fanout;
pub mod presence;

pub use fanout::Fanout;
pub use presence::PresenceRegistry;

use crate::config::Config;
use crate::db::Database;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one socket connection. Presence and fanout are keyed
/// by connection, not by user: one user may hold many sockets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

impl ConnId {
    /// Allocate the next connection id.
    pub fn next() -> Self {
        Self(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Process-wide shared state.
pub struct Hub {
    pub db: Database,
    pub config: Config,
    pub presence: PresenceRegistry,
    pub fanout: Fanout,
    /// Bearer token -> user id. Tokens are opaque and live for the
    /// process lifetime or until logout.
    pub sessions: DashMap<String, String>,
}

impl Hub {
    pub fn new(db: Database, config: Config) -> Arc<Self> {
        Arc::new(Self {
            db,
            config,
            presence: PresenceRegistry::new(),
            fanout: Fanout::new(),
            sessions: DashMap::new(),
        })
    }
}
