//! Server-to-client events.
//!
//! Tagged as `{"event": "...", "data": {...}}`. Event names match the
//! socket vocabulary of the legacy backend exactly; clients dispatch
//! on the `event` field.

use crate::types::{ChannelType, ResolutionStatus, UserStatus};
use serde::{Deserialize, Serialize};

/// Public view of a user, safe to broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub nickname: String,
    pub firstname: String,
    pub lastname: String,
}

/// Public view of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub administrator_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A pending invitation as delivered to the invitee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPayload {
    pub id: String,
    pub user_id: String,
    pub invited_by_id: String,
    pub channel_id: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelSummary>,
}

/// A persisted channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: i64,
    pub channel_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,
    /// Ids of users tagged in the message body.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Everything the server pushes over a socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A user's first connection came up.
    #[serde(rename = "user:online")]
    UserOnline { user: UserSummary },

    /// A user's last connection went away.
    #[serde(rename = "user:offline")]
    UserOffline { user: UserSummary },

    /// Snapshot of other present users, delivered to a fresh connection.
    #[serde(rename = "user:list")]
    UserList {
        online: Vec<UserSummary>,
        dnd: Vec<UserSummary>,
    },

    /// Another connection of some user changed its advertised status.
    #[serde(rename = "user:receiveStatus")]
    #[serde(rename_all = "camelCase")]
    ReceiveStatus { user_id: String, status: UserStatus },

    /// A new invitation landed for the receiving user.
    #[serde(rename = "invitation:receive")]
    InvitationReceive { invitation: InvitationPayload },

    /// An invitation was accepted or declined (echoed to the
    /// resolving user's other connections).
    #[serde(rename = "invitation:resolve")]
    InvitationResolve {
        invitation: InvitationPayload,
        status: ResolutionStatus,
    },

    /// A member was kicked or banned out of a channel.
    #[serde(rename = "user:receiveKick")]
    #[serde(rename_all = "camelCase")]
    ReceiveKick {
        user_id: String,
        channel_name: String,
        banned: bool,
    },

    /// The channel is gone (administrator left, explicit destroy, or
    /// the inactivity sweep).
    #[serde(rename = "channel:delete")]
    #[serde(rename_all = "camelCase")]
    ChannelDelete {
        channel_id: String,
        channel_name: String,
    },

    /// A non-administrator member left the channel.
    #[serde(rename = "channel:leave")]
    #[serde(rename_all = "camelCase")]
    ChannelLeave {
        user_id: String,
        channel_name: String,
    },

    /// Someone is typing in the channel.
    #[serde(rename = "channel:receiveTyping")]
    ReceiveTyping {
        author: UserSummary,
        channel: String,
        content: String,
    },

    /// A message was posted to a channel group the connection has open.
    #[serde(rename = "message")]
    Message { message: MessagePayload },

    /// A rejected command, surfaced only to the initiating connection.
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserSummary {
        UserSummary {
            id: "u-1".into(),
            email: "ada@example.com".into(),
            nickname: "ada".into(),
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
        }
    }

    #[test]
    fn event_tags_match_legacy_names() {
        let json = serde_json::to_value(ServerEvent::UserOnline { user: user() }).unwrap();
        assert_eq!(json["event"], "user:online");
        assert_eq!(json["data"]["user"]["nickname"], "ada");

        let json = serde_json::to_value(ServerEvent::ReceiveKick {
            user_id: "u-2".into(),
            channel_name: "general".into(),
            banned: true,
        })
        .unwrap();
        assert_eq!(json["event"], "user:receiveKick");
        assert_eq!(json["data"]["userId"], "u-2");
        assert_eq!(json["data"]["channelName"], "general");
    }

    #[test]
    fn optional_payload_fields_are_omitted() {
        let json = serde_json::to_value(ServerEvent::InvitationResolve {
            invitation: InvitationPayload {
                id: "i-1".into(),
                user_id: "u-1".into(),
                invited_by_id: "u-2".into(),
                channel_id: "c-1".into(),
                created_at: 1,
                invited_by: None,
                channel: None,
            },
            status: ResolutionStatus::Accept,
        })
        .unwrap();
        assert_eq!(json["event"], "invitation:resolve");
        assert_eq!(json["data"]["status"], "ACCEPT");
        assert!(json["data"]["invitation"].get("invitedBy").is_none());
    }
}
