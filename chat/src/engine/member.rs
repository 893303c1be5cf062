use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use super::events::PlayerId;

bitflags! {
    /// Per-member mode bits, broadcast verbatim in mode-change notifications.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        const OWNER     = 0x01;
        const MODERATOR = 0x02;
        const MUTED     = 0x04;
    }
}

/// In-channel state for a single member.
#[derive(Debug, Clone, Copy)]
pub struct MemberState {
    pub flags: MemberFlags,
    /// Monotonic per-channel join counter. Owner succession picks the
    /// remaining member with the lowest value.
    pub joined_seq: u64,
}

impl MemberState {
    pub fn is_owner(&self) -> bool {
        self.flags.contains(MemberFlags::OWNER)
    }

    pub fn is_moderator(&self) -> bool {
        self.flags.contains(MemberFlags::MODERATOR)
    }

    pub fn is_muted(&self) -> bool {
        self.flags.contains(MemberFlags::MUTED)
    }
}

/// The member registry of one channel: player id -> member state.
#[derive(Debug, Default)]
pub struct Members {
    entries: HashMap<PlayerId, MemberState>,
}

impl Members {
    /// Insert a fresh entry with no mode bits set.
    pub fn insert(&mut self, id: PlayerId, joined_seq: u64) {
        self.entries.insert(
            id,
            MemberState {
                flags: MemberFlags::empty(),
                joined_seq,
            },
        );
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<MemberState> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&MemberState> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut MemberState> {
        self.entries.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &MemberState)> {
        self.entries.iter().map(|(id, state)| (*id, state))
    }

    /// The member that inherits ownership when the owner departs:
    /// lowest join sequence number still present.
    pub fn successor(&self) -> Option<PlayerId> {
        self.entries
            .iter()
            .min_by_key(|(_, state)| state.joined_seq)
            .map(|(id, _)| *id)
    }
}

/// The ban list of one channel. Disjoint from the member registry by
/// construction: banning removes the member entry first.
#[derive(Debug, Default)]
pub struct BanList {
    banned: HashSet<PlayerId>,
}

impl BanList {
    /// Returns false if the player was already banned.
    pub fn insert(&mut self, id: PlayerId) -> bool {
        self.banned.insert(id)
    }

    /// Returns false if the player was not banned.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        self.banned.remove(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.banned.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.banned.len()
    }
}
