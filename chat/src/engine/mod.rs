//! The chat-channel core: channel state machine, membership registry,
//! notification codec, and the directory service that owns it all.

pub mod channel;
pub mod directory;
pub mod events;
pub mod member;
pub mod privilege;
pub mod session;
pub mod validation;

pub use channel::{Channel, ChannelFlags, ChannelMode, OpCtx};
pub use directory::ChannelDirectory;
pub use events::{ChannelEvent, LanguageId, MemberEntry, PlayerId};
pub use member::{BanList, MemberFlags, MemberState, Members};
pub use privilege::{Privilege, SecurityLevel};
pub use session::{Faction, PlayerProfile, PlayerSession, Roster, MAX_OUTBOUND_QUEUE};
