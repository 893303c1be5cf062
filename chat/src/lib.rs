//! Palaver — an embeddable chat-channel core for multiplayer game servers.
//!
//! The surrounding session/dispatch layer registers player sessions in a
//! [`engine::Roster`], constructs one [`engine::ChannelDirectory`] at
//! startup, and routes player chat commands to the directory's operations.
//! Every outcome — success or rejection — surfaces as a
//! [`engine::ChannelEvent`] pushed to the affected sessions; nothing here
//! returns errors across the channel boundary.

pub mod config;
pub mod engine;


pub use config::ChatConfig;
pub use engine::{ChannelDirectory, ChannelEvent, ChannelMode, PlayerId, Roster};
