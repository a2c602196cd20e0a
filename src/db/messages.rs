//! Channel messages and nickname tags.

use super::{DbError, now_ts};
use parlor_proto::MessagePayload;
use sqlx::SqliteConnection;

/// A persisted message.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub channel_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Ids of tagged users, resolved at insert time.
    pub tags: Vec<String>,
}

impl Message {
    pub fn payload(&self) -> MessagePayload {
        MessagePayload {
            id: self.id,
            channel_id: self.channel_id.clone(),
            user_id: self.user_id.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            author: None,
            tags: self.tags.clone(),
        }
    }
}

/// Insert a message and its tag rows. Tag nicknames that resolve to
/// no user are skipped rather than failing the whole message.
pub async fn create(
    conn: &mut SqliteConnection,
    channel_id: &str,
    author_id: &str,
    content: &str,
    tag_nicknames: &[String],
) -> Result<Message, DbError> {
    let now = now_ts();

    let result = sqlx::query(
        r#"
        INSERT INTO messages (channel_id, user_id, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(channel_id)
    .bind(author_id)
    .bind(content)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let message_id = result.last_insert_rowid();
    let mut tags = Vec::new();

    for nickname in tag_nicknames {
        let Some(user) = super::users::find_by_nickname(&mut *conn, nickname).await? else {
            continue;
        };
        sqlx::query(
            "INSERT OR IGNORE INTO tags (message_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(message_id)
        .bind(&user.id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        tags.push(user.id);
    }

    Ok(Message {
        id: message_id,
        channel_id: channel_id.to_string(),
        user_id: author_id.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
        tags,
    })
}

/// One page of a channel's messages, newest first.
pub async fn list_page(
    conn: &mut SqliteConnection,
    channel_id: &str,
    page: i64,
    limit: i64,
) -> Result<Vec<Message>, DbError> {
    let rows = sqlx::query_as::<_, (i64, String, String, String, i64, i64)>(
        r#"
        SELECT id, channel_id, user_id, content, created_at, updated_at
        FROM messages
        WHERE channel_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(channel_id)
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(&mut *conn)
    .await?;

    let mut messages = Vec::with_capacity(rows.len());
    for (id, channel_id, user_id, content, created_at, updated_at) in rows {
        let tags = sqlx::query_scalar::<_, String>("SELECT user_id FROM tags WHERE message_id = ?")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
        messages.push(Message {
            id,
            channel_id,
            user_id,
            content,
            created_at,
            updated_at,
            tags,
        });
    }

    Ok(messages)
}
