//! Client-to-server socket commands.
//!
//! Tagged as `{"action": "...", "data": {...}}`. Membership changes
//! (create, join, leave, destroy) go over HTTP; the socket carries the
//! real-time actions only.

use crate::types::{ModerationMethod, ResolutionStatus, UserStatus};
use serde::{Deserialize, Serialize};

/// Everything a client may send over its socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Advertise a new presence status to everyone else.
    SetStatus { status: UserStatus },

    /// Start receiving a channel's real-time events. Gated on
    /// membership; a non-member gets an `error` event back.
    #[serde(rename_all = "camelCase")]
    OpenChannel { channel: String },

    /// Stop receiving a channel's real-time events.
    #[serde(rename_all = "camelCase")]
    CloseChannel { channel: String },

    /// Post a message, optionally tagging users by nickname.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        channel: String,
        content: String,
        #[serde(default)]
        tags: Vec<String>,
    },

    /// Broadcast a typing indicator with the draft text.
    #[serde(rename_all = "camelCase")]
    Typing { channel: String, content: String },

    /// Invite a user (by id or nickname) into a channel.
    #[serde(rename_all = "camelCase")]
    CreateInvitation {
        channel_id: String,
        user_id: Option<String>,
        nickname: Option<String>,
    },

    /// Accept or decline a received invitation.
    #[serde(rename_all = "camelCase")]
    ResolveInvitation { id: String, status: ResolutionStatus },

    /// Withdraw a pending invitation (inviter or channel admin).
    #[serde(rename_all = "camelCase")]
    CancelInvitation { id: String },

    /// Kick or revoke a member of a channel.
    #[serde(rename_all = "camelCase")]
    Moderate {
        channel: String,
        user_id: String,
        method: ModerationMethod,
    },
}
