//! Bearer-token session handling.
//!
//! Tokens are opaque UUIDs held in the hub's session map. They are
//! process-local: a restart logs everyone out.

use crate::db::{User, users};
use crate::error::{OpError, OpResult};
use crate::state::Hub;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use uuid::Uuid;

/// Mint a session token for a user.
pub fn issue_token(hub: &Hub, user_id: &str) -> String {
    let token = Uuid::new_v4().to_string();
    hub.sessions.insert(token.clone(), user_id.to_string());
    token
}

/// Invalidate a session token. Unknown tokens are ignored.
pub fn revoke_token(hub: &Hub, token: &str) {
    hub.sessions.remove(token);
}

/// Resolve a raw token to its user.
pub async fn user_for_token(hub: &Hub, token: &str) -> OpResult<User> {
    let user_id = hub
        .sessions
        .get(token)
        .map(|entry| entry.value().clone())
        .ok_or(OpError::InvalidCredentials)?;

    let mut conn = hub.db.conn().await?;
    users::find_by_id(&mut conn, &user_id)
        .await?
        .ok_or(OpError::InvalidCredentials)
}

/// Pull the bearer token out of an Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> OpResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(OpError::InvalidCredentials)
}

/// Authenticate an HTTP request.
pub async fn authenticate(hub: &Hub, headers: &HeaderMap) -> OpResult<User> {
    let token = bearer_token(headers)?;
    user_for_token(hub, token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc-123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc-123");

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc-123"));
        assert!(bearer_token(&headers).is_err());

        headers.remove(AUTHORIZATION);
        assert!(bearer_token(&headers).is_err());
    }
}
