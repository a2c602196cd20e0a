//! Membership, ban and kick relations.
//!
//! These three tables carry the entire social-moderation state for a
//! (user, channel) pair. Every mutator takes the caller's connection,
//! so a moderation decision's ban + unkick + unmember lands in one
//! transaction or not at all.

use super::DbError;
use crate::error::{OpError, OpResult};
use sqlx::SqliteConnection;

/// Check whether a user is currently a member of a channel.
pub async fn is_member(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> Result<bool, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM channel_members WHERE user_id = ? AND channel_id = ?",
    )
    .bind(user_id)
    .bind(channel_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Add a membership row. A duplicate insert surfaces `AlreadyMember`
/// via the primary key instead of corrupting state.
pub async fn add_member(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> OpResult<()> {
    sqlx::query("INSERT INTO channel_members (channel_id, user_id, created_at) VALUES (?, ?, ?)")
        .bind(channel_id)
        .bind(user_id)
        .bind(super::now_ts())
        .execute(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return OpError::AlreadyMember;
            }
            OpError::Db(DbError::from(e))
        })?;
    Ok(())
}

/// Remove a membership row. Absent rows are reported, not silently
/// swallowed, so callers can distinguish a stale request.
pub async fn remove_member(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> OpResult<()> {
    let result = sqlx::query("DELETE FROM channel_members WHERE user_id = ? AND channel_id = ?")
        .bind(user_id)
        .bind(channel_id)
        .execute(conn)
        .await
        .map_err(DbError::from)?;
    if result.rows_affected() == 0 {
        return Err(OpError::TargetNotMember);
    }
    Ok(())
}

/// Ids of the channels a user belongs to.
pub async fn channel_ids_of(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<String>, DbError> {
    let ids =
        sqlx::query_scalar::<_, String>("SELECT channel_id FROM channel_members WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(ids)
}

/// User ids of a channel's members.
pub async fn member_ids_of(
    conn: &mut SqliteConnection,
    channel_id: &str,
) -> Result<Vec<String>, DbError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT user_id FROM channel_members WHERE channel_id = ? ORDER BY created_at ASC",
    )
    .bind(channel_id)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

/// Check whether a user is banned from a channel.
pub async fn is_banned(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> Result<bool, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM banned_members WHERE user_id = ? AND channel_id = ?",
    )
    .bind(user_id)
    .bind(channel_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Record a ban. Idempotent: re-banning an already banned user is a
/// no-op.
pub async fn ban(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT OR IGNORE INTO banned_members (channel_id, user_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(channel_id)
    .bind(user_id)
    .bind(super::now_ts())
    .execute(conn)
    .await?;
    Ok(())
}

/// Clear a ban, if present.
pub async fn clear_ban(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM banned_members WHERE user_id = ? AND channel_id = ?")
        .bind(user_id)
        .bind(channel_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Record one kick of `kicked` by `kicker`. The same kicker striking
/// the same target in the same channel twice is `AlreadyKicked`.
pub async fn record_kick(
    conn: &mut SqliteConnection,
    kicker_id: &str,
    kicked_id: &str,
    channel_id: &str,
) -> OpResult<()> {
    sqlx::query(
        r#"
        INSERT INTO kicks (kicked_user_id, kicked_by_user_id, channel_id, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(kicked_id)
    .bind(kicker_id)
    .bind(channel_id)
    .bind(super::now_ts())
    .execute(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return OpError::AlreadyKicked;
        }
        OpError::Db(DbError::from(e))
    })?;
    Ok(())
}

/// How many distinct members have kicked this user in this channel.
pub async fn count_distinct_kickers(
    conn: &mut SqliteConnection,
    kicked_id: &str,
    channel_id: &str,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(DISTINCT kicked_by_user_id) FROM kicks
        WHERE kicked_user_id = ? AND channel_id = ?
        "#,
    )
    .bind(kicked_id)
    .bind(channel_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// Whether this exact kicker already has a standing kick against the
/// target in this channel.
pub async fn was_kicked_by(
    conn: &mut SqliteConnection,
    kicker_id: &str,
    kicked_id: &str,
    channel_id: &str,
) -> Result<bool, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM kicks
        WHERE kicked_user_id = ? AND kicked_by_user_id = ? AND channel_id = ?
        "#,
    )
    .bind(kicked_id)
    .bind(kicker_id)
    .bind(channel_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Drop every kick record against a user in a channel. A ban always
/// clears the slate.
pub async fn clear_kicks(
    conn: &mut SqliteConnection,
    kicked_id: &str,
    channel_id: &str,
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM kicks WHERE kicked_user_id = ? AND channel_id = ?")
        .bind(kicked_id)
        .bind(channel_id)
        .execute(conn)
        .await?;
    Ok(())
}
