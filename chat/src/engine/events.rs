use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (one per character, stable across sessions).
pub type PlayerId = Uuid;

/// Chat language code, opaque to this core.
pub type LanguageId = u32;

/// Outbound notification emitted by channel operations. The session layer
/// frames and delivers these; this core never sends anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// Another player joined the channel (announce broadcast).
    Joined {
        channel: String,
        player: PlayerId,
        name: String,
    },

    /// Another player left the channel (announce broadcast).
    Left {
        channel: String,
        player: PlayerId,
        name: String,
    },

    /// Private confirmation that the recipient joined.
    YouJoined {
        channel: String,
        channel_id: u32,
        flags: u8,
    },

    /// Private confirmation that the recipient's membership ended
    /// (left voluntarily, or was kicked/banned).
    YouLeft { channel: String },

    /// Join rejected: password mismatch.
    WrongPassword { channel: String },

    /// Operation rejected: requester is not a member (also sent when the
    /// named channel does not exist).
    NotMember { channel: String },

    /// Operation rejected: requester lacks moderator privileges.
    NotModerator { channel: String },

    /// The channel password was changed.
    PasswordChanged {
        channel: String,
        by: PlayerId,
        by_name: String,
    },

    /// Ownership was transferred.
    OwnerChanged {
        channel: String,
        owner: PlayerId,
        owner_name: String,
    },

    /// A named target could not be resolved to a channel member.
    PlayerNotFound { channel: String, name: String },

    /// Operation rejected: only the owner may do this.
    NotOwner { channel: String },

    /// Reply to an owner query. `owner` is absent for ownerless channels.
    ChannelOwner {
        channel: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        owner: Option<String>,
    },

    /// A member's mode bits changed. Carries the old and new bit-sets.
    ModeChange {
        channel: String,
        player: PlayerId,
        old_flags: u8,
        new_flags: u8,
    },

    /// Join/leave announcements were enabled.
    AnnouncementsOn {
        channel: String,
        by: PlayerId,
        by_name: String,
    },

    /// Join/leave announcements were disabled.
    AnnouncementsOff {
        channel: String,
        by: PlayerId,
        by_name: String,
    },

    /// Moderated mode was enabled (only moderators may speak).
    ModerationOn {
        channel: String,
        by: PlayerId,
        by_name: String,
    },

    /// Moderated mode was disabled.
    ModerationOff {
        channel: String,
        by: PlayerId,
        by_name: String,
    },

    /// Speaking rejected: recipient is muted (or below the channel's
    /// speaking rank threshold).
    Muted { channel: String },

    /// A member was kicked.
    PlayerKicked {
        channel: String,
        target: PlayerId,
        target_name: String,
        by: PlayerId,
        by_name: String,
    },

    /// Join rejected: the recipient is banned from this channel.
    Banned { channel: String },

    /// A member was banned.
    PlayerBanned {
        channel: String,
        target: PlayerId,
        target_name: String,
        by: PlayerId,
        by_name: String,
    },

    /// A ban was lifted.
    PlayerUnbanned {
        channel: String,
        target: PlayerId,
        target_name: String,
        by: PlayerId,
        by_name: String,
    },

    /// Unban rejected: the named player is not banned.
    PlayerNotBanned { channel: String, name: String },

    /// Join/invite rejected: the named player is already a member.
    PlayerAlreadyMember { channel: String, name: String },

    /// Invitation delivered to the recipient.
    Invite {
        channel: String,
        from: PlayerId,
        from_name: String,
    },

    /// Invite rejected: target belongs to the opposing faction.
    InviteWrongFaction { channel: String },

    /// Operation rejected: target belongs to the opposing faction.
    WrongFaction { channel: String },

    /// The supplied channel name is not valid.
    InvalidName { name: String },

    /// Operation rejected: this channel's configuration is not
    /// player-moderable.
    NotModerated { channel: String },

    /// Confirmation to the inviter that the invite was sent.
    PlayerInvited { channel: String, name: String },

    /// Invite rejected: the named player is banned from this channel.
    PlayerInviteBanned { channel: String, name: String },

    /// Speaking rejected by the dispatch layer's rate limiter. Not
    /// produced by this core; part of the wire contract.
    Throttled { channel: String },

    /// A chat message spoken into the channel.
    Message {
        channel: String,
        sender: PlayerId,
        sender_name: String,
        text: String,
        language: LanguageId,
        chat_tag: u8,
        rank: u8,
        timestamp: DateTime<Utc>,
    },

    /// Reply to a member-list request. The sequence length is the count
    /// prefix of the wire form.
    MemberList {
        channel: String,
        members: Vec<MemberEntry>,
    },
}

/// One (identifier, mode-flags) pair in a member-list reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberEntry {
    pub player: PlayerId,
    pub flags: u8,
}
