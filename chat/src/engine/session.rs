use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use super::events::{ChannelEvent, PlayerId};
use super::privilege::{Privilege, SecurityLevel};

/// Maximum queued outbound events per session (prevents memory exhaustion
/// from slow clients).
pub const MAX_OUTBOUND_QUEUE: usize = 1024;

/// Which side of the game world a player belongs to. Opaque to this core;
/// equality is the only operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Faction(pub u32);

/// Connection-time attributes for a player session. Identity, security
/// level, and faction come from the surrounding player system.
#[derive(Debug, Clone)]
pub struct PlayerProfile {
    pub name: String,
    pub security: SecurityLevel,
    pub faction: Faction,
    /// Displayed in-game rank byte, checked against rank-gated channels.
    pub rank: u8,
    /// Chat tag carried verbatim in chat messages (AFK/DND/GM markers).
    pub chat_tag: u8,
    pub in_guild: bool,
    /// Hidden sessions (invisible staff) are only visible to elevated players.
    pub hidden: bool,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            security: SecurityLevel::Player,
            faction: Faction(0),
            rank: 0,
            chat_tag: 0,
            in_guild: false,
            hidden: false,
        }
    }
}

/// A live player session. The channel core reads its attributes and pushes
/// notifications at it; it never mutates player state.
#[derive(Debug)]
pub struct PlayerSession {
    pub id: PlayerId,
    pub name: String,
    pub security: SecurityLevel,
    pub faction: Faction,
    pub rank: u8,
    pub chat_tag: u8,
    pub in_guild: bool,
    pub hidden: bool,
    /// Players whose messages and invites this session does not receive.
    ignored: Mutex<HashSet<PlayerId>>,
    /// Outbound notifications for this session's write loop (bounded;
    /// events to slow clients are dropped rather than blocking).
    outbound: mpsc::Sender<ChannelEvent>,
    pub connected_at: DateTime<Utc>,
}

impl PlayerSession {
    fn new(id: PlayerId, profile: PlayerProfile, outbound: mpsc::Sender<ChannelEvent>) -> Self {
        Self {
            id,
            name: profile.name,
            security: profile.security,
            faction: profile.faction,
            rank: profile.rank,
            chat_tag: profile.chat_tag,
            in_guild: profile.in_guild,
            hidden: profile.hidden,
            ignored: Mutex::new(HashSet::new()),
            outbound,
            connected_at: Utc::now(),
        }
    }

    /// Deliver an event to this session. Returns false if the session is
    /// gone or its outbound queue is full.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.outbound.try_send(event).is_ok()
    }

    pub fn ignores(&self, other: PlayerId) -> bool {
        self.ignored.lock().unwrap().contains(&other)
    }

    pub fn ignore(&self, other: PlayerId) {
        self.ignored.lock().unwrap().insert(other);
    }

    pub fn unignore(&self, other: PlayerId) {
        self.ignored.lock().unwrap().remove(&other);
    }

    /// Global presence visibility: hidden sessions are only seen by
    /// themselves and elevated viewers.
    pub fn is_visible_to(&self, viewer: &PlayerSession, privilege: &Privilege) -> bool {
        !self.hidden || self.id == viewer.id || privilege.is_elevated(viewer.security)
    }
}

/// Directory of live sessions plus a persistent name index. The name index
/// outlives disconnection so moderation by name (unban) keeps working for
/// offline players.
#[derive(Debug, Default)]
pub struct Roster {
    sessions: DashMap<PlayerId, Arc<PlayerSession>>,
    names: DashMap<String, PlayerId>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Returns the session handle and the receiver its
    /// write loop drains. A reconnect under the same name replaces the
    /// stale session.
    pub fn connect(
        &self,
        profile: PlayerProfile,
    ) -> (Arc<PlayerSession>, mpsc::Receiver<ChannelEvent>) {
        let key = profile.name.to_lowercase();
        if let Some(old_id) = self.names.get(&key).map(|r| *r)
            && self.sessions.remove(&old_id).is_some()
        {
            info!(name = %profile.name, "replacing stale session for reconnecting player");
        }

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(MAX_OUTBOUND_QUEUE);
        let session = Arc::new(PlayerSession::new(id, profile, tx));

        self.names.insert(key, id);
        self.sessions.insert(id, session.clone());

        info!(player = %id, name = %session.name, "session connected");
        (session, rx)
    }

    /// Drop a live session. The name index entry is kept so the player can
    /// still be resolved by name while offline.
    pub fn disconnect(&self, id: PlayerId) -> Option<Arc<PlayerSession>> {
        let (_, session) = self.sessions.remove(&id)?;
        info!(player = %id, name = %session.name, "session disconnected");
        Some(session)
    }

    pub fn get(&self, id: PlayerId) -> Option<Arc<PlayerSession>> {
        self.sessions.get(&id).map(|s| s.clone())
    }

    pub fn is_online(&self, id: PlayerId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Resolve a name to a live session.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<PlayerSession>> {
        let id = self.names.get(&name.to_lowercase()).map(|r| *r)?;
        self.get(id)
    }

    /// Resolve a name to a player id, online or not.
    pub fn lookup_id(&self, name: &str) -> Option<PlayerId> {
        self.names.get(&name.to_lowercase()).map(|r| *r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let roster = Roster::new();
        let (session, _rx) = roster.connect(profile("alice"));

        assert!(roster.is_online(session.id));
        assert!(roster.find_by_name("Alice").is_some());

        roster.disconnect(session.id);
        assert!(!roster.is_online(session.id));
        assert!(roster.find_by_name("alice").is_none());
    }

    #[tokio::test]
    async fn test_name_index_survives_disconnect() {
        let roster = Roster::new();
        let (session, _rx) = roster.connect(profile("alice"));
        let id = session.id;

        roster.disconnect(id);
        assert_eq!(roster.lookup_id("ALICE"), Some(id));
    }

    #[tokio::test]
    async fn test_duplicate_name_replaces_old_session() {
        let roster = Roster::new();
        let (old, _rx1) = roster.connect(profile("alice"));
        let (new, _rx2) = roster.connect(profile("alice"));

        assert!(roster.get(old.id).is_none());
        assert!(roster.get(new.id).is_some());
        assert_eq!(roster.lookup_id("alice"), Some(new.id));
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let roster = Roster::new();
        let (session, mut rx) = roster.connect(profile("alice"));

        assert!(session.send(ChannelEvent::YouLeft {
            channel: "world".into()
        }));
        match rx.try_recv().unwrap() {
            ChannelEvent::YouLeft { channel } => assert_eq!(channel, "world"),
            other => panic!("Expected YouLeft event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_events() {
        let roster = Roster::new();
        let (session, _rx) = roster.connect(profile("alice"));

        for _ in 0..MAX_OUTBOUND_QUEUE {
            assert!(session.send(ChannelEvent::YouLeft {
                channel: "world".into()
            }));
        }
        assert!(!session.send(ChannelEvent::YouLeft {
            channel: "world".into()
        }));
    }

    #[tokio::test]
    async fn test_ignore_list() {
        let roster = Roster::new();
        let (alice, _rx1) = roster.connect(profile("alice"));
        let (bob, _rx2) = roster.connect(profile("bob"));

        assert!(!alice.ignores(bob.id));
        alice.ignore(bob.id);
        assert!(alice.ignores(bob.id));
        alice.unignore(bob.id);
        assert!(!alice.ignores(bob.id));
    }

    #[tokio::test]
    async fn test_hidden_session_visibility() {
        use crate::config::ChannelSection;

        let roster = Roster::new();
        let privilege = Privilege::new(&ChannelSection::default());

        let (hidden, _rx1) = roster.connect(PlayerProfile {
            name: "ghost".into(),
            security: SecurityLevel::GameMaster,
            hidden: true,
            ..Default::default()
        });
        let (player, _rx2) = roster.connect(profile("alice"));
        let (gm, _rx3) = roster.connect(PlayerProfile {
            name: "warden".into(),
            security: SecurityLevel::GameMaster,
            ..Default::default()
        });

        assert!(!hidden.is_visible_to(&player, &privilege));
        assert!(hidden.is_visible_to(&gm, &privilege));
        assert!(hidden.is_visible_to(&hidden, &privilege));
        assert!(player.is_visible_to(&hidden, &privilege));
    }
}
