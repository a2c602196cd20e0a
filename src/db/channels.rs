//! Channel records and lifecycle.
//!
//! Channels are soft-deleted: `deleted_at` tombstones them out of all
//! active lookups while history stays queryable. The partial unique
//! index on live names means a deleted channel's name can be reused.

use super::{DbError, now_ts};
use parlor_proto::{ChannelSummary, ChannelType};
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// A chat channel.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub channel_type: ChannelType,
    pub administrator_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Channel {
    pub fn summary(&self) -> ChannelSummary {
        ChannelSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            channel_type: self.channel_type,
            administrator_id: self.administrator_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

type ChannelRow = (String, String, String, String, i64, i64, Option<i64>);

fn row_to_channel(row: ChannelRow) -> Result<Channel, DbError> {
    let (id, name, channel_type, administrator_id, created_at, updated_at, deleted_at) = row;
    let channel_type = channel_type
        .parse::<ChannelType>()
        .map_err(|e| DbError::Internal(e.to_string()))?;
    Ok(Channel {
        id,
        name,
        channel_type,
        administrator_id,
        created_at,
        updated_at,
        deleted_at,
    })
}

const SELECT_CHANNEL: &str = r#"
SELECT id, name, type, administrator_id, created_at, updated_at, deleted_at
FROM channels
"#;

/// Insert a new channel. Name uniqueness among live channels is
/// checked by the caller inside the same transaction; the partial
/// unique index is the backstop.
pub async fn create(
    conn: &mut SqliteConnection,
    name: &str,
    channel_type: ChannelType,
    administrator_id: &str,
) -> Result<Channel, DbError> {
    let now = now_ts();
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO channels (id, name, type, administrator_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(channel_type.as_str())
    .bind(administrator_id)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(Channel {
        id,
        name: name.to_string(),
        channel_type,
        administrator_id: administrator_id.to_string(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    })
}

/// Find a live channel by name (case-insensitive).
pub async fn find_active_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Channel>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(&format!(
        "{SELECT_CHANNEL} WHERE name = ? COLLATE NOCASE AND deleted_at IS NULL"
    ))
    .bind(name)
    .fetch_optional(conn)
    .await?;
    row.map(row_to_channel).transpose()
}

/// Find a live channel by id.
pub async fn find_active_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Channel>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(&format!(
        "{SELECT_CHANNEL} WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(row_to_channel).transpose()
}

/// Find a channel by id regardless of deletion state. Invitation
/// cancellation still needs the administrator of a tombstoned channel.
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Channel>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(&format!("{SELECT_CHANNEL} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(row_to_channel).transpose()
}

/// Soft-delete a channel. Returns false if it was already gone.
pub async fn soft_delete(conn: &mut SqliteConnection, id: &str) -> Result<bool, DbError> {
    let now = now_ts();
    let result = sqlx::query(
        r#"
        UPDATE channels SET deleted_at = ?, updated_at = ?
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Pagination metadata, serialized alongside every listed page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl PageMeta {
    fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            per_page: limit,
            current_page: page,
            last_page: (total.max(0) + limit - 1) / limit.max(1),
        }
    }
}

/// List live public channels the given user could join: the ones they
/// are not in and not banned from, ordered by name.
pub async fn list_public(
    conn: &mut SqliteConnection,
    user_id: &str,
    page: i64,
    limit: i64,
) -> Result<Page<Channel>, DbError> {
    const FILTER: &str = r#"
        FROM channels c
        WHERE c.type = 'PUBLIC' AND c.deleted_at IS NULL
          AND c.id NOT IN (SELECT channel_id FROM channel_members WHERE user_id = ?)
          AND c.id NOT IN (SELECT channel_id FROM banned_members WHERE user_id = ?)
    "#;

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) {FILTER}"))
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, ChannelRow>(&format!(
        r#"
        SELECT c.id, c.name, c.type, c.administrator_id, c.created_at, c.updated_at, c.deleted_at
        {FILTER}
        ORDER BY c.name ASC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(user_id)
    .bind(user_id)
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(&mut *conn)
    .await?;

    let data = rows
        .into_iter()
        .map(row_to_channel)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        data,
        meta: PageMeta::new(total, page, limit),
    })
}

/// Live channels whose last activity (latest message, or creation for
/// channels that never saw one) is older than the cutoff timestamp.
pub async fn inactive_since(
    conn: &mut SqliteConnection,
    cutoff: i64,
) -> Result<Vec<Channel>, DbError> {
    let rows = sqlx::query_as::<_, ChannelRow>(&format!(
        r#"
        {SELECT_CHANNEL}
        WHERE deleted_at IS NULL
          AND COALESCE(
                (SELECT MAX(m.created_at) FROM messages m WHERE m.channel_id = channels.id),
                created_at
              ) < ?
        "#
    ))
    .bind(cutoff)
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(row_to_channel).collect()
}
