//! User records: registration, credentials and lookups.

use super::{DbError, now_ts};
use crate::error::{OpError, OpResult};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use parlor_proto::UserSummary;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// A registered user. Password hash never leaves this layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub nickname: String,
    pub firstname: String,
    pub lastname: String,
    pub password_hash: String,
    pub notify_mentions_only: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Broadcast-safe view of this user.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            email: self.email.clone(),
            nickname: self.nickname.clone(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
        }
    }
}

type UserRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    bool,
    i64,
    i64,
);

fn row_to_user(row: UserRow) -> User {
    let (
        id,
        email,
        nickname,
        firstname,
        lastname,
        password_hash,
        notify_mentions_only,
        created_at,
        updated_at,
    ) = row;
    User {
        id,
        email,
        nickname,
        firstname,
        lastname,
        password_hash,
        notify_mentions_only,
        created_at,
        updated_at,
    }
}

const SELECT_USER: &str = r#"
SELECT id, email, nickname, firstname, lastname, password_hash,
       notify_mentions_only, created_at, updated_at
FROM users
"#;

/// Input for [`create`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
}

/// Register a new user with an argon2-hashed password.
pub async fn create(conn: &mut SqliteConnection, new_user: NewUser) -> OpResult<User> {
    let password_hash = hash_password(&new_user.password)?;
    let now = now_ts();
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, nickname, firstname, lastname, password_hash,
                           notify_mentions_only, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new_user.email)
    .bind(&new_user.nickname)
    .bind(&new_user.firstname)
    .bind(&new_user.lastname)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return OpError::InvalidState("email or nickname is already registered".into());
        }
        OpError::Db(DbError::from(e))
    })?;

    Ok(User {
        id,
        email: new_user.email,
        nickname: new_user.nickname,
        firstname: new_user.firstname,
        lastname: new_user.lastname,
        password_hash,
        notify_mentions_only: false,
        created_at: now,
        updated_at: now,
    })
}

/// Find a user by id.
pub async fn find_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(row_to_user))
}

/// Find a user by nickname (case-insensitive).
pub async fn find_by_nickname(
    conn: &mut SqliteConnection,
    nickname: &str,
) -> Result<Option<User>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "{SELECT_USER} WHERE nickname = ? COLLATE NOCASE"
    ))
    .bind(nickname)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(row_to_user))
}

/// Find a user by email.
pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = ?"))
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(row_to_user))
}

/// Fetch a batch of users by id, skipping ids that no longer resolve.
pub async fn find_many(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<Vec<User>, DbError> {
    let mut users = Vec::new();
    for id in ids {
        if let Some(user) = find_by_id(&mut *conn, id).await? {
            users.push(user);
        }
    }
    Ok(users)
}

/// Flip the mentions-only notification preference.
pub async fn set_notify_mentions_only(
    conn: &mut SqliteConnection,
    user_id: &str,
    value: bool,
) -> Result<(), DbError> {
    sqlx::query("UPDATE users SET notify_mentions_only = ?, updated_at = ? WHERE id = ?")
        .bind(value)
        .bind(now_ts())
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Verify email + password, returning the user on success.
///
/// A missing account still performs a dummy verification so the
/// response time does not reveal whether the email exists.
pub async fn verify_credentials(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> OpResult<User> {
    match find_by_email(conn, email).await? {
        Some(user) if verify_password(&user.password_hash, password) => Ok(user),
        Some(_) => Err(OpError::InvalidCredentials),
        None => {
            let _ = verify_password(DUMMY_HASH, password);
            Err(OpError::InvalidCredentials)
        }
    }
}

// A syntactically valid argon2 hash that matches no real password.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$GpZ3sK/oH9p7bIfIHg6TpXAcBV2BV5QLXS1DJbLEv2E";

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String, DbError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash.
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
