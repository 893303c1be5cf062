use bitflags::bitflags;
use chrono::Utc;
use tracing::{info, warn};

use super::events::{ChannelEvent, LanguageId, MemberEntry, PlayerId};
use super::member::{BanList, MemberFlags, Members};
use super::privilege::Privilege;
use super::session::{PlayerSession, Roster};

bitflags! {
    /// Channel classification bits, fixed at construction from catalog data
    /// (constant channels) or defaulted (custom channels).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelFlags: u8 {
        const CUSTOM    = 0x01;
        const TRADE     = 0x02;
        const CITY_ONLY = 0x04;
        const NOT_LFG   = 0x08;
        const GENERAL   = 0x10;
        const LFG       = 0x20;
    }
}

impl ChannelFlags {
    /// The guild-recruitment flag combination. Players with a guild
    /// silently skip joining channels marked exactly this way; the check
    /// deliberately does not generalize to other combinations.
    pub fn is_guild_recruitment(self) -> bool {
        self == Self::GENERAL.union(Self::CITY_ONLY).union(Self::NOT_LFG)
    }

    /// Parse catalog flag names ("GENERAL", "CITY_ONLY", ...).
    pub fn parse_names(names: &[String]) -> Result<Self, String> {
        let mut flags = Self::empty();
        for name in names {
            match Self::from_name(name) {
                Some(flag) => flags |= flag,
                None => return Err(format!("unknown channel flag {name:?}")),
            }
        }
        Ok(flags)
    }
}

/// Which member mode bit a SetMode operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Moderator,
    Mute,
}

/// Collaborators a channel operation reads: the live session roster and the
/// privilege policy. Channel operations never mutate either.
pub struct OpCtx<'a> {
    pub roster: &'a Roster,
    pub privilege: &'a Privilege,
}

/// A single chat channel: membership, moderation state, ban list, and the
/// fan-out of every notification its operations produce.
///
/// Invariants held after every public operation:
/// - the owner, if set, is a member and the only member with the OWNER bit
/// - the ban list and the member registry are disjoint
/// - constant channels (nonzero id) never acquire an owner
#[derive(Debug)]
pub struct Channel {
    name: String,
    /// Zero for custom (player-created) channels, nonzero for constant
    /// (server-defined) ones.
    channel_id: u32,
    flags: ChannelFlags,
    announce: bool,
    moderate: bool,
    /// Empty string means no password.
    password: String,
    owner: Option<PlayerId>,
    members: Members,
    banned: BanList,
    /// Speaking rank threshold for the reserved rank-gated channels.
    min_speak_rank: Option<u8>,
    next_seq: u64,
}

impl Channel {
    /// A server-defined channel from the catalog. Announcements default to
    /// off and the channel never elects an owner.
    pub fn new_constant(
        id: u32,
        name: String,
        flags: ChannelFlags,
        min_speak_rank: Option<u8>,
    ) -> Self {
        Self {
            name,
            channel_id: id,
            flags,
            announce: false,
            moderate: false,
            password: String::new(),
            owner: None,
            members: Members::default(),
            banned: BanList::default(),
            min_speak_rank,
            next_seq: 0,
        }
    }

    /// A player-created channel. The first successful joiner becomes owner.
    pub fn new_custom(name: String, announce: bool) -> Self {
        Self {
            name,
            channel_id: 0,
            flags: ChannelFlags::CUSTOM,
            announce,
            moderate: false,
            password: String::new(),
            owner: None,
            members: Members::default(),
            banned: BanList::default(),
            min_speak_rank: None,
            next_seq: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn flags(&self) -> ChannelFlags {
        self.flags
    }

    pub fn is_constant(&self) -> bool {
        self.channel_id != 0
    }

    pub fn is_announcing(&self) -> bool {
        self.announce
    }

    pub fn is_moderated(&self) -> bool {
        self.moderate
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, id: PlayerId) -> bool {
        self.members.contains(id)
    }

    pub fn is_banned(&self, id: PlayerId) -> bool {
        self.banned.contains(id)
    }

    pub fn member_flags(&self, id: PlayerId) -> Option<MemberFlags> {
        self.members.get(id).map(|state| state.flags)
    }

    // ── Membership ──────────────────────────────────────────────────

    /// Join the channel. The "joined" broadcast goes out before the new
    /// entry is inserted, so the newcomer never receives its own join.
    pub fn join(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession, password: &str) {
        if self.members.contains(who.id) {
            // Repeated joins of built-in channels happen on every zone
            // change and stay silent.
            if !self.is_constant() {
                who.send(ChannelEvent::PlayerAlreadyMember {
                    channel: self.name.clone(),
                    name: who.name.clone(),
                });
            }
            return;
        }
        if self.banned.contains(who.id) {
            who.send(ChannelEvent::Banned {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.password.is_empty() && password != self.password {
            who.send(ChannelEvent::WrongPassword {
                channel: self.name.clone(),
            });
            return;
        }
        if self.flags.is_guild_recruitment() && who.in_guild {
            return;
        }

        if self.announce && !ctx.privilege.joins_silently(who.security) {
            self.broadcast(
                ctx,
                &ChannelEvent::Joined {
                    channel: self.name.clone(),
                    player: who.id,
                    name: who.name.clone(),
                },
            );
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.members.insert(who.id, seq);

        who.send(ChannelEvent::YouJoined {
            channel: self.name.clone(),
            channel_id: self.channel_id,
            flags: self.flags.bits(),
        });

        if !self.is_constant() && self.owner.is_none() {
            self.owner = Some(who.id);
            self.set_member_flags(
                who.id,
                MemberFlags::OWNER | MemberFlags::MODERATOR,
                MemberFlags::empty(),
            );
            self.broadcast(
                ctx,
                &ChannelEvent::OwnerChanged {
                    channel: self.name.clone(),
                    owner: who.id,
                    owner_name: who.name.clone(),
                },
            );
        }

        info!(player = %who.id, name = %who.name, channel = %self.name, "joined channel");
    }

    /// Leave the channel. `announce_flag` controls the private "you left"
    /// confirmation; the member broadcast follows the channel's announce
    /// setting. A departing owner is silently succeeded by the remaining
    /// member with the lowest join sequence.
    pub fn leave(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession, announce_flag: bool) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }

        if announce_flag {
            who.send(ChannelEvent::YouLeft {
                channel: self.name.clone(),
            });
        }

        let was_owner = self.owner == Some(who.id);
        self.members.remove(who.id);

        if self.announce {
            self.broadcast(
                ctx,
                &ChannelEvent::Left {
                    channel: self.name.clone(),
                    player: who.id,
                    name: who.name.clone(),
                },
            );
        }

        if was_owner {
            self.owner = self.members.successor();
            if let Some(next) = self.owner
                && let Some((old_flags, new_flags)) =
                    self.set_member_flags(next, MemberFlags::OWNER, MemberFlags::empty())
            {
                self.broadcast(
                    ctx,
                    &ChannelEvent::ModeChange {
                        channel: self.name.clone(),
                        player: next,
                        old_flags,
                        new_flags,
                    },
                );
            }
        }

        info!(player = %who.id, name = %who.name, channel = %self.name, "left channel");
    }

    // ── Moderation ──────────────────────────────────────────────────

    /// Kick (or ban, which also blocks rejoin) a member. Ownership held by
    /// the target transfers to the acting moderator.
    pub fn kick_or_ban(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession, target_name: &str, ban: bool) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.can_moderate(ctx, who) {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }
        let Some(target) = ctx.roster.find_by_name(target_name) else {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        };
        if !self.members.contains(target.id) {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target.name.clone(),
            });
            return;
        }
        let target_was_owner = self.owner == Some(target.id);
        if target_was_owner
            && self.owner != Some(who.id)
            && !ctx.privilege.is_elevated(who.security)
        {
            who.send(ChannelEvent::NotOwner {
                channel: self.name.clone(),
            });
            return;
        }

        let newly_banned = ban && self.banned.insert(target.id);
        self.members.remove(target.id);

        if newly_banned {
            self.broadcast(
                ctx,
                &ChannelEvent::PlayerBanned {
                    channel: self.name.clone(),
                    target: target.id,
                    target_name: target.name.clone(),
                    by: who.id,
                    by_name: who.name.clone(),
                },
            );
        } else {
            self.broadcast(
                ctx,
                &ChannelEvent::PlayerKicked {
                    channel: self.name.clone(),
                    target: target.id,
                    target_name: target.name.clone(),
                    by: who.id,
                    by_name: who.name.clone(),
                },
            );
        }

        // The target is no longer a broadcast recipient; tell its client
        // directly that the membership ended.
        target.send(ChannelEvent::YouLeft {
            channel: self.name.clone(),
        });

        if target_was_owner {
            if who.id == target.id {
                // The owner removed themselves; succession runs as on leave.
                self.owner = self.members.successor();
                if let Some(next) = self.owner
                    && let Some((old_flags, new_flags)) =
                        self.set_member_flags(next, MemberFlags::OWNER, MemberFlags::empty())
                {
                    self.broadcast(
                        ctx,
                        &ChannelEvent::ModeChange {
                            channel: self.name.clone(),
                            player: next,
                            old_flags,
                            new_flags,
                        },
                    );
                }
            } else {
                self.owner = Some(who.id);
                if let Some((old_flags, new_flags)) = self.set_member_flags(
                    who.id,
                    MemberFlags::OWNER | MemberFlags::MODERATOR,
                    MemberFlags::empty(),
                ) {
                    self.broadcast(
                        ctx,
                        &ChannelEvent::ModeChange {
                            channel: self.name.clone(),
                            player: who.id,
                            old_flags,
                            new_flags,
                        },
                    );
                }
                self.broadcast(
                    ctx,
                    &ChannelEvent::OwnerChanged {
                        channel: self.name.clone(),
                        owner: who.id,
                        owner_name: who.name.clone(),
                    },
                );
            }
        }

        info!(
            target = %target.name, by = %who.name, channel = %self.name,
            banned = newly_banned, "member removed"
        );
    }

    /// Lift a ban. The target is resolved through the persistent name
    /// index and need not be online.
    pub fn unban(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession, target_name: &str) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.can_moderate(ctx, who) {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }
        let Some(target_id) = ctx.roster.lookup_id(target_name) else {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        };
        if !self.banned.remove(target_id) {
            who.send(ChannelEvent::PlayerNotBanned {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        }

        self.broadcast(
            ctx,
            &ChannelEvent::PlayerUnbanned {
                channel: self.name.clone(),
                target: target_id,
                target_name: target_name.to_string(),
                by: who.id,
                by_name: who.name.clone(),
            },
        );

        info!(target = %target_name, by = %who.name, channel = %self.name, "ban lifted");
    }

    /// Set or clear (empty string) the channel password.
    pub fn set_password(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession, new_password: &str) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.can_moderate(ctx, who) {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }

        self.password = new_password.to_string();
        self.broadcast(
            ctx,
            &ChannelEvent::PasswordChanged {
                channel: self.name.clone(),
                by: who.id,
                by_name: who.name.clone(),
            },
        );
    }

    /// Toggle a member's moderator or muted bit.
    pub fn set_mode(
        &mut self,
        ctx: &OpCtx<'_>,
        who: &PlayerSession,
        target_name: &str,
        mode: ChannelMode,
        set: bool,
    ) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.can_moderate(ctx, who) {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }
        let Some(target) = ctx.roster.find_by_name(target_name) else {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        };
        if !target.is_visible_to(who, ctx.privilege) || !self.members.contains(target.id) {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        }
        if who.id == target.id && self.owner == Some(who.id) && mode == ChannelMode::Moderator {
            // The owner's own moderator bit is not toggled.
            return;
        }
        if self.owner == Some(target.id) && self.owner != Some(who.id) {
            who.send(ChannelEvent::NotOwner {
                channel: self.name.clone(),
            });
            return;
        }
        if who.faction != target.faction {
            let promoting_moderator = mode == ChannelMode::Moderator && set;
            let allowed = ctx.privilege.cross_faction_allowed()
                && (!promoting_moderator
                    || (ctx.privilege.is_elevated(who.security)
                        && ctx.privilege.is_elevated(target.security)));
            if !allowed {
                who.send(ChannelEvent::WrongFaction {
                    channel: self.name.clone(),
                });
                return;
            }
        }

        let flag = match mode {
            ChannelMode::Moderator => MemberFlags::MODERATOR,
            ChannelMode::Mute => MemberFlags::MUTED,
        };
        let (add, remove) = if set {
            (flag, MemberFlags::empty())
        } else {
            (MemberFlags::empty(), flag)
        };
        if let Some((old_flags, new_flags)) = self.set_member_flags(target.id, add, remove) {
            self.broadcast(
                ctx,
                &ChannelEvent::ModeChange {
                    channel: self.name.clone(),
                    player: target.id,
                    old_flags,
                    new_flags,
                },
            );
        }
    }

    /// Transfer ownership to a named member.
    pub fn set_owner(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession, target_name: &str) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if self.owner != Some(who.id) && !ctx.privilege.is_elevated(who.security) {
            who.send(ChannelEvent::NotOwner {
                channel: self.name.clone(),
            });
            return;
        }
        if self.is_constant() {
            // Server-defined channels never acquire an owner.
            who.send(ChannelEvent::NotModerated {
                channel: self.name.clone(),
            });
            return;
        }
        let Some(target) = ctx.roster.find_by_name(target_name) else {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        };
        if !self.members.contains(target.id) {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target.name.clone(),
            });
            return;
        }
        if who.faction != target.faction && !ctx.privilege.cross_faction_allowed() {
            who.send(ChannelEvent::WrongFaction {
                channel: self.name.clone(),
            });
            return;
        }
        if self.owner == Some(target.id) {
            return;
        }

        if let Some(prev) = self.owner
            && let Some(state) = self.members.get_mut(prev)
        {
            state.flags.remove(MemberFlags::OWNER);
        }
        self.owner = Some(target.id);
        if let Some((old_flags, new_flags)) = self.set_member_flags(
            target.id,
            MemberFlags::OWNER | MemberFlags::MODERATOR,
            MemberFlags::empty(),
        ) {
            self.broadcast(
                ctx,
                &ChannelEvent::ModeChange {
                    channel: self.name.clone(),
                    player: target.id,
                    old_flags,
                    new_flags,
                },
            );
        }
        self.broadcast(
            ctx,
            &ChannelEvent::OwnerChanged {
                channel: self.name.clone(),
                owner: target.id,
                owner_name: target.name.clone(),
            },
        );

        info!(owner = %target.name, by = %who.name, channel = %self.name, "ownership transferred");
    }

    /// Toggle join/leave announcements. Constant channels are configured
    /// server-side and reject the toggle.
    pub fn toggle_announcements(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.can_moderate(ctx, who) {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }
        if self.is_constant() {
            who.send(ChannelEvent::NotModerated {
                channel: self.name.clone(),
            });
            return;
        }

        self.announce = !self.announce;
        let event = if self.announce {
            ChannelEvent::AnnouncementsOn {
                channel: self.name.clone(),
                by: who.id,
                by_name: who.name.clone(),
            }
        } else {
            ChannelEvent::AnnouncementsOff {
                channel: self.name.clone(),
                by: who.id,
                by_name: who.name.clone(),
            }
        };
        self.broadcast(ctx, &event);
    }

    /// Toggle moderated mode (only the owner and moderators may speak).
    pub fn toggle_moderation(&mut self, ctx: &OpCtx<'_>, who: &PlayerSession) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        if !self.can_moderate(ctx, who) {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }
        if self.is_constant() {
            who.send(ChannelEvent::NotModerated {
                channel: self.name.clone(),
            });
            return;
        }

        self.moderate = !self.moderate;
        let event = if self.moderate {
            ChannelEvent::ModerationOn {
                channel: self.name.clone(),
                by: who.id,
                by_name: who.name.clone(),
            }
        } else {
            ChannelEvent::ModerationOff {
                channel: self.name.clone(),
                by: who.id,
                by_name: who.name.clone(),
            }
        };
        self.broadcast(ctx, &event);
    }

    // ── Chat ────────────────────────────────────────────────────────

    /// Speak into the channel. The message reaches every member (the
    /// speaker included) except listeners whose ignore list contains the
    /// speaker.
    pub fn say(&self, ctx: &OpCtx<'_>, who: &PlayerSession, text: &str, language: LanguageId) {
        let Some(state) = self.members.get(who.id).copied() else {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        };
        if state.is_muted() {
            who.send(ChannelEvent::Muted {
                channel: self.name.clone(),
            });
            return;
        }
        if let Some(min_rank) = self.min_speak_rank
            && who.rank < min_rank
            && !ctx.privilege.is_elevated(who.security)
        {
            who.send(ChannelEvent::Muted {
                channel: self.name.clone(),
            });
            return;
        }
        if self.moderate
            && !state.is_moderator()
            && self.owner != Some(who.id)
            && !ctx.privilege.is_elevated(who.security)
        {
            who.send(ChannelEvent::NotModerator {
                channel: self.name.clone(),
            });
            return;
        }

        // Moderator speech bypasses listener ignore lists when channels
        // are configured cross-faction.
        let skip_ignore = state.is_moderator() && ctx.privilege.cross_faction_allowed();

        let event = ChannelEvent::Message {
            channel: self.name.clone(),
            sender: who.id,
            sender_name: who.name.clone(),
            text: text.to_string(),
            language,
            chat_tag: who.chat_tag,
            rank: who.rank,
            timestamp: Utc::now(),
        };

        for (id, _) in self.members.iter() {
            let Some(listener) = ctx.roster.get(id) else {
                continue;
            };
            if !skip_ignore && id != who.id && listener.ignores(who.id) {
                continue;
            }
            if !listener.send(event.clone()) {
                warn!(player = %id, channel = %self.name, "failed to deliver chat message");
            }
        }
    }

    /// Invite a named player. The invite is suppressed when the target
    /// ignores the actor, but the actor's confirmation is sent regardless.
    pub fn invite(&self, ctx: &OpCtx<'_>, who: &PlayerSession, target_name: &str) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }
        let Some(target) = ctx.roster.find_by_name(target_name) else {
            who.send(ChannelEvent::PlayerNotFound {
                channel: self.name.clone(),
                name: target_name.to_string(),
            });
            return;
        };
        if self.members.contains(target.id) {
            who.send(ChannelEvent::PlayerAlreadyMember {
                channel: self.name.clone(),
                name: target.name.clone(),
            });
            return;
        }
        if self.banned.contains(target.id) {
            who.send(ChannelEvent::PlayerInviteBanned {
                channel: self.name.clone(),
                name: target.name.clone(),
            });
            return;
        }
        if who.faction != target.faction && !ctx.privilege.cross_faction_allowed() {
            who.send(ChannelEvent::InviteWrongFaction {
                channel: self.name.clone(),
            });
            return;
        }

        if !target.ignores(who.id) {
            target.send(ChannelEvent::Invite {
                channel: self.name.clone(),
                from: who.id,
                from_name: who.name.clone(),
            });
        }
        who.send(ChannelEvent::PlayerInvited {
            channel: self.name.clone(),
            name: target.name.clone(),
        });
    }

    /// Send the requester the channel member list. Staff above the
    /// configured level and sessions hidden from the requester are omitted.
    pub fn list(&self, ctx: &OpCtx<'_>, who: &PlayerSession) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }

        let actor_elevated = ctx.privilege.is_elevated(who.security);
        let mut entries = Vec::new();
        for (id, state) in self.members.iter() {
            let Some(session) = ctx.roster.get(id) else {
                continue;
            };
            if (actor_elevated || ctx.privilege.listed_in_roster(session.security))
                && session.is_visible_to(who, ctx.privilege)
            {
                entries.push(MemberEntry {
                    player: id,
                    flags: state.flags.bits(),
                });
            }
        }

        who.send(ChannelEvent::MemberList {
            channel: self.name.clone(),
            members: entries,
        });
    }

    /// Reply with the current owner's display name.
    pub fn owner_query(&self, ctx: &OpCtx<'_>, who: &PlayerSession) {
        if !self.members.contains(who.id) {
            who.send(ChannelEvent::NotMember {
                channel: self.name.clone(),
            });
            return;
        }

        let owner = self
            .owner
            .and_then(|id| ctx.roster.get(id))
            .map(|session| session.name.clone());
        who.send(ChannelEvent::ChannelOwner {
            channel: self.name.clone(),
            owner,
        });
    }

    // ── Internals ───────────────────────────────────────────────────

    fn can_moderate(&self, ctx: &OpCtx<'_>, who: &PlayerSession) -> bool {
        ctx.privilege.is_elevated(who.security)
            || self
                .members
                .get(who.id)
                .is_some_and(|state| state.is_moderator())
    }

    /// Apply flag bits to a member and return the (old, new) bit-sets.
    fn set_member_flags(
        &mut self,
        id: PlayerId,
        add: MemberFlags,
        remove: MemberFlags,
    ) -> Option<(u8, u8)> {
        let state = self.members.get_mut(id)?;
        let old = state.flags;
        state.flags.insert(add);
        state.flags.remove(remove);
        Some((old.bits(), state.flags.bits()))
    }

    /// Deliver an event to every current member.
    fn broadcast(&self, ctx: &OpCtx<'_>, event: &ChannelEvent) {
        for (id, _) in self.members.iter() {
            let Some(session) = ctx.roster.get(id) else {
                continue;
            };
            if !session.send(event.clone()) {
                warn!(player = %id, channel = %self.name, "failed to deliver channel event");
            }
        }
    }
}
