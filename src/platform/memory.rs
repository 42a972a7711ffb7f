//! In-memory chat platform used by unit tests.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use futures::future::BoxFuture;

use super::{
    Attachment, BotUser, ChannelMessage, ChatPlatform, Guild, PlatformError, PlatformResult,
    Snowflake, TextChannel,
};

/// Identifier of the bot account inside the fake.
pub const BOT_ID: Snowflake = 1;
const DM_CHANNEL_BASE: Snowflake = 900_000;

/// Number of mutating remote calls issued so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub sends: usize,
    pub edits: usize,
    pub deletes: usize,
}

#[derive(Default)]
struct Inner {
    guilds: Vec<Guild>,
    channels: BTreeMap<Snowflake, TextChannel>,
    messages: BTreeMap<Snowflake, Vec<ChannelMessage>>,
    dm_channels: BTreeMap<Snowflake, Snowflake>,
    reactions: Vec<(Snowflake, Snowflake, String)>,
    uploads: Vec<(Snowflake, Attachment)>,
    deleted: Vec<Snowflake>,
    calls: CallCounts,
    next_id: Snowflake,
    interference: Option<Snowflake>,
    failing_channel: Option<Snowflake>,
    vanishing: Vec<Snowflake>,
    dms_disabled: bool,
}

impl Inner {
    fn allocate_id(&mut self) -> Snowflake {
        self.next_id += 1;
        self.next_id
    }

    fn push_message(&mut self, channel_id: Snowflake, author_id: Snowflake, content: String) -> ChannelMessage {
        let message = ChannelMessage {
            id: self.allocate_id(),
            channel_id,
            author_id,
            content,
        };
        self.messages
            .entry(channel_id)
            .or_default()
            .push(message.clone());
        message
    }

    fn ensure_reachable(&self, channel_id: Snowflake) -> PlatformResult<()> {
        if self.failing_channel == Some(channel_id) {
            return Err(PlatformError::UnknownChannel(channel_id));
        }
        if self.messages.contains_key(&channel_id) {
            Ok(())
        } else {
            Err(PlatformError::UnknownChannel(channel_id))
        }
    }
}

/// Shared, cloneable fake platform.
#[derive(Clone)]
pub struct MemoryPlatform {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// Empty platform with ids starting well above [`BOT_ID`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 1_000,
                ..Inner::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Register a guild text channel with the given topic.
    pub fn add_channel(&self, id: Snowflake, name: &str, topic: Option<&str>) -> TextChannel {
        let mut inner = self.lock();
        let guild = Guild {
            id: 77,
            name: "Emu Hub".into(),
        };
        if !inner.guilds.contains(&guild) {
            inner.guilds.push(guild.clone());
        }
        let channel = TextChannel {
            id,
            guild_id: Some(guild.id),
            guild_name: guild.name,
            name: name.into(),
            topic: topic.map(str::to_string),
        };
        inner.channels.insert(id, channel.clone());
        inner.messages.entry(id).or_default();
        channel
    }

    /// Change a channel topic after registration.
    pub fn set_topic(&self, channel_id: Snowflake, topic: &str) {
        if let Some(channel) = self.lock().channels.get_mut(&channel_id) {
            channel.topic = Some(topic.into());
        }
    }

    /// Post a message as an arbitrary author without counting it as a bot call.
    pub fn seed(&self, channel_id: Snowflake, author_id: Snowflake, content: &str) -> Snowflake {
        self.lock()
            .push_message(channel_id, author_id, content.into())
            .id
    }

    /// Contents of a channel, oldest first.
    pub fn contents(&self, channel_id: Snowflake) -> Vec<String> {
        self.messages(channel_id)
            .into_iter()
            .map(|message| message.content)
            .collect()
    }

    /// Messages of a channel, oldest first.
    pub fn messages(&self, channel_id: Snowflake) -> Vec<ChannelMessage> {
        self.lock()
            .messages
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Direct messages received by `user_id`.
    pub fn dms_to(&self, user_id: Snowflake) -> Vec<String> {
        let dm_channel = self.lock().dm_channels.get(&user_id).copied();
        dm_channel
            .map(|channel_id| self.contents(channel_id))
            .unwrap_or_default()
    }

    /// Counters of send/edit/delete calls.
    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Reset the counters, typically after seeding a scenario.
    pub fn reset_calls(&self) {
        self.lock().calls = CallCounts::default();
    }

    /// Ids of deleted messages in deletion order.
    pub fn deleted(&self) -> Vec<Snowflake> {
        self.lock().deleted.clone()
    }

    /// Reactions added so far as `(channel, message, emoji)`.
    pub fn reactions(&self) -> Vec<(Snowflake, Snowflake, String)> {
        self.lock().reactions.clone()
    }

    /// Files uploaded so far.
    pub fn uploads(&self) -> Vec<(Snowflake, Attachment)> {
        self.lock().uploads.clone()
    }

    /// On the next send into `channel_id`, also post an extra bot message, as a
    /// concurrent pass would.
    pub fn interfere_on_next_send(&self, channel_id: Snowflake) {
        self.lock().interference = Some(channel_id);
    }

    /// Remove `message_id` just before the bot's delete lands, as another
    /// moderator would, so the delete reports an unknown message.
    pub fn vanish_before_delete(&self, message_id: Snowflake) {
        self.lock().vanishing.push(message_id);
    }

    /// Make opening any DM channel fail, as for users who closed their DMs.
    pub fn disable_direct_messages(&self) {
        self.lock().dms_disabled = true;
    }

    /// Make every call touching `channel_id` fail.
    pub fn fail_channel(&self, channel_id: Snowflake) {
        self.lock().failing_channel = Some(channel_id);
    }
}

impl ChatPlatform for MemoryPlatform {
    fn current_user(&self) -> BoxFuture<'static, PlatformResult<BotUser>> {
        Box::pin(async move {
            Ok(BotUser {
                id: BOT_ID,
                name: "compat".into(),
            })
        })
    }

    fn guilds(&self) -> BoxFuture<'static, PlatformResult<Vec<Guild>>> {
        let guilds = self.lock().guilds.clone();
        Box::pin(async move { Ok(guilds) })
    }

    fn text_channels(&self, guild: Guild) -> BoxFuture<'static, PlatformResult<Vec<TextChannel>>> {
        let channels = self
            .lock()
            .channels
            .values()
            .filter(|channel| channel.guild_id == Some(guild.id))
            .cloned()
            .collect();
        Box::pin(async move { Ok(channels) })
    }

    fn channel(&self, channel_id: Snowflake) -> BoxFuture<'static, PlatformResult<TextChannel>> {
        let inner = self.lock();
        let result = inner
            .ensure_reachable(channel_id)
            .and_then(|()| {
                inner
                    .channels
                    .get(&channel_id)
                    .cloned()
                    .ok_or(PlatformError::UnknownChannel(channel_id))
            });
        Box::pin(async move { result })
    }

    fn history(
        &self,
        channel_id: Snowflake,
    ) -> BoxFuture<'static, PlatformResult<Vec<ChannelMessage>>> {
        let inner = self.lock();
        let result = inner
            .ensure_reachable(channel_id)
            .map(|()| inner.messages[&channel_id].clone());
        Box::pin(async move { result })
    }

    fn send(
        &self,
        channel_id: Snowflake,
        content: String,
    ) -> BoxFuture<'static, PlatformResult<ChannelMessage>> {
        let mut inner = self.lock();
        let result = inner.ensure_reachable(channel_id).map(|()| {
            inner.calls.sends += 1;
            let message = inner.push_message(channel_id, BOT_ID, content);
            if inner.interference == Some(channel_id) {
                inner.interference = None;
                inner.push_message(channel_id, BOT_ID, "interfering pass".into());
            }
            message
        });
        Box::pin(async move { result })
    }

    fn edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: String,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let mut inner = self.lock();
        let result = inner.ensure_reachable(channel_id).and_then(|()| {
            inner.calls.edits += 1;
            inner
                .messages
                .get_mut(&channel_id)
                .and_then(|messages| messages.iter_mut().find(|m| m.id == message_id))
                .map(|message| message.content = content)
                .ok_or(PlatformError::UnknownMessage {
                    channel_id,
                    message_id,
                })
        });
        Box::pin(async move { result })
    }

    fn delete(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let mut inner = self.lock();
        let result = inner.ensure_reachable(channel_id).and_then(|()| {
            if let Some(index) = inner.vanishing.iter().position(|id| *id == message_id) {
                inner.vanishing.remove(index);
                if let Some(messages) = inner.messages.get_mut(&channel_id) {
                    messages.retain(|m| m.id != message_id);
                }
                return Err(PlatformError::UnknownMessage {
                    channel_id,
                    message_id,
                });
            }
            inner.calls.deletes += 1;
            let messages = inner.messages.get_mut(&channel_id).ok_or(
                PlatformError::UnknownChannel(channel_id),
            )?;
            let position = messages
                .iter()
                .position(|m| m.id == message_id)
                .ok_or(PlatformError::UnknownMessage {
                    channel_id,
                    message_id,
                })?;
            messages.remove(position);
            inner.deleted.push(message_id);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn dm_channel(&self, user_id: Snowflake) -> BoxFuture<'static, PlatformResult<Snowflake>> {
        let mut inner = self.lock();
        let channel_id = DM_CHANNEL_BASE + user_id;
        if inner.dms_disabled {
            return Box::pin(async move { Err(PlatformError::UnknownChannel(channel_id)) });
        }
        inner.dm_channels.insert(user_id, channel_id);
        inner.messages.entry(channel_id).or_default();
        Box::pin(async move { Ok(channel_id) })
    }

    fn react(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        self.lock().reactions.push((channel_id, message_id, emoji));
        Box::pin(async move { Ok(()) })
    }

    fn upload(
        &self,
        channel_id: Snowflake,
        attachment: Attachment,
    ) -> BoxFuture<'static, PlatformResult<ChannelMessage>> {
        let mut inner = self.lock();
        let result = inner.ensure_reachable(channel_id).map(|()| {
            let message =
                inner.push_message(channel_id, BOT_ID, format!("[file: {}]", attachment.file_name));
            inner.uploads.push((channel_id, attachment));
            message
        });
        Box::pin(async move { result })
    }
}
