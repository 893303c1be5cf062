use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::channel::{Channel, ChannelFlags, ChannelMode, OpCtx};
use super::events::{ChannelEvent, LanguageId, PlayerId};
use super::privilege::Privilege;
use super::session::{PlayerSession, Roster};
use super::validation;
use crate::config::ChatConfig;

/// The channel directory: owns every channel in the realm and resolves
/// operations onto them. Constant channels are seeded from the catalog at
/// construction and live for the process lifetime; custom channels are
/// created on first join and reclaimed once empty.
///
/// Entries are keyed by lowercased name; the DashMap shard lock gives each
/// channel the per-instance mutual exclusion concurrent callers need.
pub struct ChannelDirectory {
    channels: DashMap<String, Channel>,
    roster: Arc<Roster>,
    privilege: Privilege,
    config: Arc<ChatConfig>,
}

impl ChannelDirectory {
    pub fn new(config: Arc<ChatConfig>, roster: Arc<Roster>) -> Self {
        let directory = Self {
            channels: DashMap::new(),
            roster,
            privilege: Privilege::new(&config.channel),
            config,
        };

        for seed in &directory.config.constant {
            let flags = match ChannelFlags::parse_names(&seed.flags) {
                Ok(flags) => flags,
                Err(e) => {
                    warn!(channel = %seed.name, error = %e, "ignoring unknown catalog flags");
                    ChannelFlags::empty()
                }
            };
            let min_speak_rank = directory.config.reserved.min_speak_rank(&seed.name);
            directory.channels.insert(
                Self::key(&seed.name),
                Channel::new_constant(seed.id, seed.name.clone(), flags, min_speak_rank),
            );
        }
        info!(count = directory.channels.len(), "seeded constant channels");

        directory
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(&Self::key(name))
    }

    /// Read access to a channel, for introspection by the embedding server.
    pub fn inspect<T>(&self, name: &str, f: impl FnOnce(&Channel) -> T) -> Option<T> {
        self.channels.get(&Self::key(name)).map(|ch| f(&ch))
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Join a channel, creating it as a custom channel if the name is
    /// unknown.
    pub fn join(&self, player: PlayerId, name: &str, password: &str) {
        let Some(who) = self.roster.get(player) else {
            return;
        };
        if let Err(e) = validation::validate_channel_name(name) {
            debug!(player = %who.name, error = %e, "rejected channel name");
            who.send(ChannelEvent::InvalidName {
                name: name.to_string(),
            });
            return;
        }

        let mut entry = self.channels.entry(Self::key(name)).or_insert_with(|| {
            // Announcements default on for player channels; the reserved
            // world-broadcast channel stays quiet.
            let announce = !name.eq_ignore_ascii_case(&self.config.reserved.world_channel);
            info!(channel = %name, "created custom channel");
            Channel::new_custom(name.to_string(), announce)
        });
        entry.join(&self.ctx(), &who, password);
    }

    pub fn leave(&self, player: PlayerId, name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.leave(ctx, who, true);
        });
        self.reclaim_if_empty(name);
    }

    pub fn kick(&self, player: PlayerId, name: &str, target_name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.kick_or_ban(ctx, who, target_name, false);
        });
        self.reclaim_if_empty(name);
    }

    pub fn ban(&self, player: PlayerId, name: &str, target_name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.kick_or_ban(ctx, who, target_name, true);
        });
        self.reclaim_if_empty(name);
    }

    pub fn unban(&self, player: PlayerId, name: &str, target_name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.unban(ctx, who, target_name);
        });
    }

    pub fn set_password(&self, player: PlayerId, name: &str, password: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.set_password(ctx, who, password);
        });
    }

    pub fn set_mode(
        &self,
        player: PlayerId,
        name: &str,
        target_name: &str,
        mode: ChannelMode,
        set: bool,
    ) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.set_mode(ctx, who, target_name, mode, set);
        });
    }

    pub fn set_owner(&self, player: PlayerId, name: &str, target_name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.set_owner(ctx, who, target_name);
        });
    }

    pub fn owner_query(&self, player: PlayerId, name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.owner_query(ctx, who);
        });
    }

    pub fn toggle_announcements(&self, player: PlayerId, name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.toggle_announcements(ctx, who);
        });
    }

    pub fn toggle_moderation(&self, player: PlayerId, name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.toggle_moderation(ctx, who);
        });
    }

    pub fn say(&self, player: PlayerId, name: &str, text: &str, language: LanguageId) {
        if let Err(e) = validation::validate_message(text) {
            debug!(error = %e, "dropped invalid chat message");
            return;
        }
        self.with_channel(player, name, |channel, ctx, who| {
            channel.say(ctx, who, text, language);
        });
    }

    pub fn invite(&self, player: PlayerId, name: &str, target_name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.invite(ctx, who, target_name);
        });
    }

    pub fn list(&self, player: PlayerId, name: &str) {
        self.with_channel(player, name, |channel, ctx, who| {
            channel.list(ctx, who);
        });
    }

    /// Remove a dropped session from every channel it was in (silent
    /// leaves; ownership succession still runs), then unregister it.
    pub fn disconnect(&self, player: PlayerId) {
        if let Some(who) = self.roster.get(player) {
            let joined: Vec<String> = self
                .channels
                .iter()
                .filter(|entry| entry.is_member(player))
                .map(|entry| entry.key().clone())
                .collect();

            let ctx = self.ctx();
            for key in &joined {
                if let Some(mut channel) = self.channels.get_mut(key) {
                    channel.leave(&ctx, &who, false);
                }
            }
            for key in &joined {
                self.reclaim_if_empty(key);
            }
        }
        self.roster.disconnect(player);
    }

    // ── Internals ───────────────────────────────────────────────────

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    fn ctx(&self) -> OpCtx<'_> {
        OpCtx {
            roster: &self.roster,
            privilege: &self.privilege,
        }
    }

    /// Resolve the acting session and the named channel, then run the
    /// operation. An unknown channel name reads as "not a member of it".
    fn with_channel(
        &self,
        player: PlayerId,
        name: &str,
        f: impl FnOnce(&mut Channel, &OpCtx<'_>, &PlayerSession),
    ) {
        let Some(who) = self.roster.get(player) else {
            return;
        };
        let Some(mut channel) = self.channels.get_mut(&Self::key(name)) else {
            who.send(ChannelEvent::NotMember {
                channel: name.to_string(),
            });
            return;
        };
        f(&mut channel, &self.ctx(), &who);
    }

    /// Drop an empty custom channel. Constant channels persist even when
    /// nobody is in them.
    fn reclaim_if_empty(&self, name: &str) {
        let removed = self
            .channels
            .remove_if(&Self::key(name), |_, channel| {
                !channel.is_constant() && channel.member_count() == 0
            })
            .is_some();
        if removed {
            info!(channel = %name, "reclaimed empty custom channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConstantChannel;
    use crate::engine::session::PlayerProfile;
    use tokio::sync::mpsc;

    fn seeded_config() -> ChatConfig {
        let mut config = ChatConfig::default();
        config.constant = vec![
            ConstantChannel {
                id: 1,
                name: "General".into(),
                flags: vec!["GENERAL".into(), "CITY_ONLY".into()],
            },
            ConstantChannel {
                id: 3,
                name: "LocalDefense".into(),
                flags: vec!["GENERAL".into()],
            },
        ];
        config
    }

    fn setup() -> (ChannelDirectory, Arc<Roster>) {
        let roster = Arc::new(Roster::new());
        let directory = ChannelDirectory::new(Arc::new(seeded_config()), roster.clone());
        (directory, roster)
    }

    fn connect(
        roster: &Roster,
        name: &str,
    ) -> (Arc<PlayerSession>, mpsc::Receiver<ChannelEvent>) {
        roster.connect(PlayerProfile {
            name: name.into(),
            ..Default::default()
        })
    }

    fn drain(rx: &mut mpsc::Receiver<ChannelEvent>) {
        while rx.try_recv().is_ok() {}
    }

    #[tokio::test]
    async fn test_constant_channels_are_seeded() {
        let (directory, _roster) = setup();
        assert_eq!(directory.channel_count(), 2);
        assert!(directory.contains("general"));
        assert!(directory.contains("GENERAL"));

        let (id, flags) = directory
            .inspect("General", |ch| (ch.channel_id(), ch.flags()))
            .unwrap();
        assert_eq!(id, 1);
        assert!(flags.contains(ChannelFlags::GENERAL | ChannelFlags::CITY_ONLY));
    }

    #[tokio::test]
    async fn test_rank_gate_applied_from_reserved_config() {
        let (directory, roster) = setup();
        let (recruit, mut rx) = roster.connect(PlayerProfile {
            name: "recruit".into(),
            rank: 0,
            ..Default::default()
        });

        directory.join(recruit.id, "LocalDefense", "");
        drain(&mut rx);
        directory.say(recruit.id, "LocalDefense", "help!", 0);
        match rx.try_recv().unwrap() {
            ChannelEvent::Muted { .. } => {}
            other => panic!("Expected Muted below speak rank, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_channel_created_on_join_and_reclaimed() {
        let (directory, roster) = setup();
        let (alice, _rx) = connect(&roster, "alice");

        directory.join(alice.id, "raid-1", "");
        assert!(directory.contains("raid-1"));
        assert_eq!(
            directory.inspect("raid-1", |ch| ch.channel_id()),
            Some(0),
            "player-created channels are custom"
        );

        directory.leave(alice.id, "raid-1");
        assert!(!directory.contains("raid-1"), "empty custom channel reclaimed");

        // Constant channels survive emptiness.
        directory.join(alice.id, "general", "");
        directory.leave(alice.id, "general");
        assert!(directory.contains("general"));
    }

    #[tokio::test]
    async fn test_channel_lookup_is_case_insensitive() {
        let (directory, roster) = setup();
        let (alice, _rx_a) = connect(&roster, "alice");
        let (bob, _rx_b) = connect(&roster, "bob");

        directory.join(alice.id, "Raid-1", "");
        directory.join(bob.id, "raid-1", "");

        assert_eq!(directory.inspect("RAID-1", |ch| ch.member_count()), Some(2));
        // Display name keeps the case of first creation.
        assert_eq!(
            directory.inspect("raid-1", |ch| ch.name().to_string()),
            Some("Raid-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_world_channel_defaults_to_quiet() {
        let (directory, roster) = setup();
        let (alice, _rx) = connect(&roster, "alice");

        directory.join(alice.id, "world", "");
        assert_eq!(directory.inspect("world", |ch| ch.is_announcing()), Some(false));

        directory.join(alice.id, "raid-1", "");
        assert_eq!(directory.inspect("raid-1", |ch| ch.is_announcing()), Some(true));
    }

    #[tokio::test]
    async fn test_unknown_channel_reads_as_not_member() {
        let (directory, roster) = setup();
        let (alice, mut rx) = connect(&roster, "alice");

        directory.say(alice.id, "nowhere", "hello?", 0);
        match rx.try_recv().unwrap() {
            ChannelEvent::NotMember { channel } => assert_eq!(channel, "nowhere"),
            other => panic!("Expected NotMember, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_channel_name_rejected() {
        let (directory, roster) = setup();
        let (alice, mut rx) = connect(&roster, "alice");

        directory.join(alice.id, "bad\nname", "");
        match rx.try_recv().unwrap() {
            ChannelEvent::InvalidName { name } => assert_eq!(name, "bad\nname"),
            other => panic!("Expected InvalidName, got {:?}", other),
        }
        assert!(!directory.contains("bad\nname"));
    }

    #[tokio::test]
    async fn test_invalid_message_dropped_silently() {
        let (directory, roster) = setup();
        let (alice, mut rx) = connect(&roster, "alice");

        directory.join(alice.id, "raid-1", "");
        drain(&mut rx);
        directory.say(alice.id, "raid-1", "   ", 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_sweeps_all_channels() {
        let (directory, roster) = setup();
        let (alice, _rx_a) = connect(&roster, "alice");
        let (bob, mut rx_b) = connect(&roster, "bob");

        directory.join(alice.id, "raid-1", "");
        directory.join(alice.id, "general", "");
        directory.join(bob.id, "raid-1", "");
        drain(&mut rx_b);

        directory.disconnect(alice.id);

        assert!(!roster.is_online(alice.id));
        assert_eq!(directory.inspect("general", |ch| ch.member_count()), Some(0));
        assert_eq!(directory.inspect("raid-1", |ch| ch.member_count()), Some(1));

        // Ownership of the custom channel passed to bob.
        assert_eq!(directory.inspect("raid-1", |ch| ch.owner()), Some(Some(bob.id)));

        // The leave was silent for the dropped session, but the announce
        // broadcast still reached remaining members.
        let mut saw_left = false;
        while let Ok(event) = rx_b.try_recv() {
            if let ChannelEvent::Left { player, .. } = event {
                assert_eq!(player, alice.id);
                saw_left = true;
            }
        }
        assert!(saw_left);
    }

    #[tokio::test]
    async fn test_disconnect_empties_and_reclaims_custom_channels() {
        let (directory, roster) = setup();
        let (alice, _rx) = connect(&roster, "alice");

        directory.join(alice.id, "raid-1", "");
        directory.disconnect(alice.id);

        assert!(!directory.contains("raid-1"));
    }

    #[tokio::test]
    async fn test_ops_from_unknown_session_are_ignored() {
        let (directory, _roster) = setup();
        // A session id the roster has never seen: no panic, no state change.
        directory.join(uuid::Uuid::new_v4(), "raid-1", "");
        assert!(!directory.contains("raid-1"));
    }
}
