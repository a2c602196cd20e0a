//! Shared fixtures for the integration suites.

use parlor::config::{Config, ListenConfig, ServerConfig, SweepConfig};
use parlor::db::users::{self, NewUser};
use parlor::db::{Database, User};
use parlor::state::Hub;
use std::sync::Arc;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            name: "chat.test".to_string(),
        },
        listen: ListenConfig {
            address: "127.0.0.1:0".parse().unwrap(),
        },
        database: None,
        sweep: SweepConfig::default(),
    }
}

/// Fresh hub backed by a private in-memory database.
pub async fn test_hub() -> Arc<Hub> {
    let db = Database::new(":memory:").await.expect("in-memory database");
    Hub::new(db, test_config())
}

/// Register a user; email is derived from the nickname.
pub async fn register(hub: &Hub, nickname: &str) -> User {
    let mut conn = hub.db.conn().await.unwrap();
    users::create(
        &mut conn,
        NewUser {
            email: format!("{nickname}@example.com"),
            nickname: nickname.to_string(),
            firstname: nickname.to_string(),
            lastname: "Tester".to_string(),
            password: "hunter2".to_string(),
        },
    )
    .await
    .expect("user registration")
}
