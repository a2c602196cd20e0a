//! parlord - the Parlor chat server.
//!
//! A channel-based chat backend: accounts, public and private
//! channels, invitations, community moderation with ban escalation,
//! and real-time fanout over WebSockets.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod state;
