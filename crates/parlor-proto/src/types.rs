//! Scalar sum types shared by the server and its clients.
//!
//! The legacy backend kept these as bare strings; here each one is a
//! proper enum with exhaustive matching, parsed from and rendered to
//! the same uppercase tokens the database and the wire carry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when an uppercase token does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseTypeError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($(#[$doc:meta])* $name:ident, $kind:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// The uppercase token stored in the database and sent on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseTypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Self::$variant),)+
                    other => Err(ParseTypeError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Channel visibility. Immutable after creation.
    ChannelType, "channel type", {
        Public => "PUBLIC",
        Private => "PRIVATE",
    }
);

string_enum!(
    /// Per-connection presence status. Never persisted.
    UserStatus, "user status", {
        Online => "ONLINE",
        Dnd => "DND",
        Offline => "OFFLINE",
    }
);

string_enum!(
    /// How a member is removed from a channel.
    ///
    /// `Kick` accumulates toward an automatic ban; `Revoke` is the
    /// administrator's immediate ban.
    ModerationMethod, "moderation method", {
        Kick => "KICK",
        Revoke => "REVOKE",
    }
);

string_enum!(
    /// Invitee's answer to a pending invitation.
    ResolutionStatus, "resolution status", {
        Accept => "ACCEPT",
        Decline => "DECLINE",
    }
);
