//! The invitation ledger.
//!
//! Only pending invitations exist as rows; accept and decline both
//! delete, so "accepted" is derived from membership, never stored.

use super::{DbError, now_ts};
use parlor_proto::InvitationPayload;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// A pending invitation.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub id: String,
    pub user_id: String,
    pub invited_by_id: String,
    pub channel_id: String,
    pub created_at: i64,
}

impl Invitation {
    pub fn payload(&self) -> InvitationPayload {
        InvitationPayload {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            invited_by_id: self.invited_by_id.clone(),
            channel_id: self.channel_id.clone(),
            created_at: self.created_at,
            invited_by: None,
            channel: None,
        }
    }
}

type InvitationRow = (String, String, String, String, i64);

fn row_to_invitation(row: InvitationRow) -> Invitation {
    let (id, user_id, invited_by_id, channel_id, created_at) = row;
    Invitation {
        id,
        user_id,
        invited_by_id,
        channel_id,
        created_at,
    }
}

const SELECT_INVITATION: &str = r#"
SELECT id, user_id, invited_by_id, channel_id, created_at
FROM invitations
"#;

/// Insert a pending invitation. The caller has already ruled out a
/// duplicate inside the same transaction.
pub async fn create(
    conn: &mut SqliteConnection,
    user_id: &str,
    invited_by_id: &str,
    channel_id: &str,
) -> Result<Invitation, DbError> {
    let now = now_ts();
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO invitations (id, user_id, invited_by_id, channel_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(invited_by_id)
    .bind(channel_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(Invitation {
        id,
        user_id: user_id.to_string(),
        invited_by_id: invited_by_id.to_string(),
        channel_id: channel_id.to_string(),
        created_at: now,
    })
}

/// Find an invitation by id.
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<Invitation>, DbError> {
    let row = sqlx::query_as::<_, InvitationRow>(&format!("{SELECT_INVITATION} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(row_to_invitation))
}

/// Find the unresolved invitation for a (user, channel) pair, if any.
pub async fn find_pending(
    conn: &mut SqliteConnection,
    user_id: &str,
    channel_id: &str,
) -> Result<Option<Invitation>, DbError> {
    let row = sqlx::query_as::<_, InvitationRow>(&format!(
        "{SELECT_INVITATION} WHERE user_id = ? AND channel_id = ?"
    ))
    .bind(user_id)
    .bind(channel_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(row_to_invitation))
}

/// Delete an invitation row (resolution or cancellation).
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM invitations WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// All unresolved invitations a user sent, newest first.
pub async fn sent_by(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<Invitation>, DbError> {
    let rows = sqlx::query_as::<_, InvitationRow>(&format!(
        "{SELECT_INVITATION} WHERE invited_by_id = ? ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(row_to_invitation).collect())
}

/// All unresolved invitations a user received, newest first.
pub async fn received_by(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<Invitation>, DbError> {
    let rows = sqlx::query_as::<_, InvitationRow>(&format!(
        "{SELECT_INVITATION} WHERE user_id = ? ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(row_to_invitation).collect())
}
