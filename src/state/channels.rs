//! Classification of channels by topic markers and the registry of list/log channels.

use dashmap::DashMap;

use crate::platform::{Snowflake, TextChannel};

/// Topic marker of channels mirroring the compatibility list.
pub const LIST_MARKER: &str = "<yuzu-compat: list>";
/// Topic marker of channels receiving the audit trail.
pub const LOG_MARKER: &str = "<yuzu-compat: log>";
/// Topic marker disabling reprimand DMs for foreign messages in a list channel.
pub const NO_REPRIMAND_MARKER: &str = "<yuzu-compat: noreprimand>";

/// Role a channel plays for the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    List,
    Log,
}

/// Role advertised by a channel topic. The list marker wins over the log marker.
pub fn classify(topic: &str) -> Option<ChannelRole> {
    if topic.contains(LIST_MARKER) {
        Some(ChannelRole::List)
    } else if topic.contains(LOG_MARKER) {
        Some(ChannelRole::Log)
    } else {
        None
    }
}

/// Whether authors of foreign messages in this channel get a warning DM.
pub fn reprimands_enabled(topic: &str) -> bool {
    !topic.contains(NO_REPRIMAND_MARKER)
}

/// Channels currently mirroring the list or receiving the audit trail.
#[derive(Default)]
pub struct ChannelRegistry {
    list: DashMap<Snowflake, TextChannel>,
    log: DashMap<Snowflake, TextChannel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every channel, ahead of a fresh discovery.
    pub fn clear(&self) {
        self.list.clear();
        self.log.clear();
    }

    /// Register `channel` under the role its topic advertises, if any.
    pub fn register(&self, channel: TextChannel) -> Option<ChannelRole> {
        let role = classify(channel.topic())?;
        match role {
            ChannelRole::List => self.add_list_channel(channel),
            ChannelRole::Log => {
                self.log.insert(channel.id, channel);
            }
        }
        Some(role)
    }

    /// Register a list channel, dropping any log registration of the same channel.
    pub fn add_list_channel(&self, channel: TextChannel) {
        self.log.remove(&channel.id);
        self.list.insert(channel.id, channel);
    }

    /// Whether `channel_id` is a registered list channel.
    pub fn is_list_channel(&self, channel_id: Snowflake) -> bool {
        self.list.contains_key(&channel_id)
    }

    /// Registered list channels ordered by id.
    pub fn list_channels(&self) -> Vec<TextChannel> {
        sorted(&self.list)
    }

    /// Registered log channels ordered by id.
    pub fn log_channels(&self) -> Vec<TextChannel> {
        sorted(&self.log)
    }
}

fn sorted(map: &DashMap<Snowflake, TextChannel>) -> Vec<TextChannel> {
    let mut channels = map
        .iter()
        .map(|entry| entry.value().clone())
        .collect::<Vec<_>>();
    channels.sort_by_key(|channel| channel.id);
    channels
}
