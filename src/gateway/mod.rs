//! HTTP and WebSocket surface.
//!
//! The gateway is a thin shell: handlers authenticate, decode, call
//! one engine operation and encode its result. Membership changes go
//! over HTTP; the socket carries the real-time traffic.

pub mod auth;
mod http;
mod ws;

use crate::state::Hub;
use axum::Router;
use axum::routing::{delete, get, post};
use std::sync::Arc;
use tracing::info;

/// Build the full route table.
pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/auth/register", post(http::register))
        .route("/auth/login", post(http::login))
        .route("/auth/logout", post(http::logout))
        .route("/me", get(http::me))
        .route("/me/notifications", post(http::update_notifications))
        .route("/me/channels", get(http::my_channels))
        .route("/channels", get(http::list_channels).post(http::create_channel))
        .route("/channels/join", post(http::join_channel))
        .route("/channels/:id", delete(http::destroy_channel))
        .route("/channels/:id/leave", post(http::leave_channel))
        .route("/channels/:id/members", get(http::channel_members))
        .route("/channels/:id/messages", get(http::channel_messages))
        .route("/invitations", get(http::list_invitations))
        .route("/invitations/:id", delete(http::cancel_invitation))
        .route("/ws", get(ws::upgrade))
        .with_state(hub)
}

/// Bind and serve until the process is stopped.
pub async fn serve(hub: Arc<Hub>) -> anyhow::Result<()> {
    let address = hub.config.listen.address;
    let app = router(hub);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
