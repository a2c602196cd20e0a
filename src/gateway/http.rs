//! HTTP handlers.

use super::auth;
use crate::db::{Channel, Page, users};
use crate::engine::{channels, invitations, messages};
use crate::error::{OpError, OpResult};
use crate::state::Hub;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use parlor_proto::{ChannelSummary, ChannelType, InvitationPayload, UserSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub nickname: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub user: UserSummary,
    pub token: String,
}

pub async fn register(
    State(hub): State<Arc<Hub>>,
    Json(body): Json<RegisterBody>,
) -> OpResult<impl IntoResponse> {
    let mut conn = hub.db.conn().await?;
    let user = users::create(
        &mut conn,
        users::NewUser {
            email: body.email,
            nickname: body.nickname,
            firstname: body.firstname,
            lastname: body.lastname,
            password: body.password,
        },
    )
    .await?;
    drop(conn);

    let token = auth::issue_token(&hub, &user.id);
    info!(user = %user.nickname, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(SessionBody {
            user: user.summary(),
            token,
        }),
    ))
}

pub async fn login(
    State(hub): State<Arc<Hub>>,
    Json(body): Json<LoginBody>,
) -> OpResult<Json<SessionBody>> {
    let mut conn = hub.db.conn().await?;
    let user = users::verify_credentials(&mut conn, &body.email, &body.password).await?;
    drop(conn);

    let token = auth::issue_token(&hub, &user.id);
    Ok(Json(SessionBody {
        user: user.summary(),
        token,
    }))
}

pub async fn logout(State(hub): State<Arc<Hub>>, headers: HeaderMap) -> OpResult<StatusCode> {
    let token = auth::bearer_token(&headers)?;
    auth::revoke_token(&hub, token);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    #[serde(flatten)]
    pub user: UserSummary,
    pub notify_mentions_only: bool,
}

pub async fn me(State(hub): State<Arc<Hub>>, headers: HeaderMap) -> OpResult<Json<ProfileBody>> {
    let user = auth::authenticate(&hub, &headers).await?;
    Ok(Json(ProfileBody {
        user: user.summary(),
        notify_mentions_only: user.notify_mentions_only,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsBody {
    pub notify_mentions_only: bool,
}

pub async fn update_notifications(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Json(body): Json<NotificationsBody>,
) -> OpResult<StatusCode> {
    let user = auth::authenticate(&hub, &headers).await?;
    let mut conn = hub.db.conn().await?;
    users::set_notify_mentions_only(&mut conn, &user.id, body.notify_mentions_only).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_channels(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
) -> OpResult<Json<Vec<ChannelSummary>>> {
    let user = auth::authenticate(&hub, &headers).await?;
    let joined = channels::list_joined(&hub, &user).await?;
    Ok(Json(joined.iter().map(Channel::summary).collect()))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

pub async fn list_channels(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> OpResult<Json<Page<ChannelSummary>>> {
    let user = auth::authenticate(&hub, &headers).await?;
    let page = channels::list_public(&hub, &user, params.page.max(1), params.limit.clamp(1, 100))
        .await?;
    Ok(Json(Page {
        data: page.data.iter().map(Channel::summary).collect(),
        meta: page.meta,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateChannelBody {
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
}

pub async fn create_channel(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Json(body): Json<CreateChannelBody>,
) -> OpResult<impl IntoResponse> {
    let user = auth::authenticate(&hub, &headers).await?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(OpError::InvalidState("channel name must not be empty".into()));
    }
    let channel = channels::create(&hub, &user, name, body.channel_type).await?;
    Ok((StatusCode::CREATED, Json(channel.summary())))
}

#[derive(Debug, Deserialize)]
pub struct JoinChannelBody {
    pub name: String,
}

pub async fn join_channel(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Json(body): Json<JoinChannelBody>,
) -> OpResult<Json<ChannelSummary>> {
    let user = auth::authenticate(&hub, &headers).await?;
    let channel = channels::join(&hub, &user, body.name.trim()).await?;
    Ok(Json(channel.summary()))
}

pub async fn destroy_channel(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> OpResult<StatusCode> {
    let user = auth::authenticate(&hub, &headers).await?;
    channels::destroy(&hub, &user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave_channel(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> OpResult<StatusCode> {
    let user = auth::authenticate(&hub, &headers).await?;
    channels::leave(&hub, &user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn channel_members(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> OpResult<Json<Vec<UserSummary>>> {
    let user = auth::authenticate(&hub, &headers).await?;
    let members = channels::members(&hub, &user, &id).await?;
    Ok(Json(members))
}

pub async fn channel_messages(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> OpResult<Json<Vec<parlor_proto::MessagePayload>>> {
    let user = auth::authenticate(&hub, &headers).await?;
    let page = messages::list(&hub, &user, &id, params.page.max(1), params.limit.clamp(1, 100))
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
pub struct InvitationsBody {
    pub sent: Vec<InvitationPayload>,
    pub received: Vec<InvitationPayload>,
}

pub async fn list_invitations(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
) -> OpResult<Json<InvitationsBody>> {
    let user = auth::authenticate(&hub, &headers).await?;
    let (sent, received) = invitations::list_for_user(&hub, &user).await?;
    Ok(Json(InvitationsBody { sent, received }))
}

pub async fn cancel_invitation(
    State(hub): State<Arc<Hub>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> OpResult<StatusCode> {
    let user = auth::authenticate(&hub, &headers).await?;
    invitations::cancel(&hub, &user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
