//! The core operations: channel lifecycle, invitations, moderation,
//! messages, presence activity and the inactivity sweep.
//!
//! Every operation validates its preconditions first, runs its
//! mutations inside one transaction, and fans out events only after
//! the commit - a rolled-back transaction never broadcasts anything.

pub mod activity;
pub mod channels;
pub mod invitations;
pub mod messages;
pub mod moderation;
pub mod sweep;
