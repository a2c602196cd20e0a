//! Wire vocabulary for the Parlor chat server.
//!
//! Everything that crosses a socket lives here: the tagged event and
//! command enums, their payload structs, and the small sum types the
//! server stores as uppercase strings (`PUBLIC`, `KICK`, ...). Field
//! names serialize in camelCase to match the JSON the web clients
//! already speak.

mod command;
mod event;
mod types;

pub use command::ClientCommand;
pub use event::{
    ChannelSummary, InvitationPayload, MessagePayload, ServerEvent, UserSummary,
};
pub use types::{ChannelType, ModerationMethod, ParseTypeError, ResolutionStatus, UserStatus};
