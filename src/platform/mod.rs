//! Port to the chat platform hosting the list channels.
//!
//! Every remote effect the bot has goes through [`ChatPlatform`], so the
//! reconciler and the command layer can run against the Discord REST API in
//! production and against an in-memory fake in tests.

pub mod discord;
pub mod error;
#[cfg(test)]
pub mod memory;

use futures::future::BoxFuture;

pub use self::error::{PlatformError, PlatformResult};

/// Snowflake identifier of a user, channel, guild or message.
pub type Snowflake = u64;

/// The account the bot is logged in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUser {
    pub id: Snowflake,
    pub name: String,
}

/// A server the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
}

/// A text channel together with the metadata the bot classifies it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChannel {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub guild_name: String,
    pub name: String,
    pub topic: Option<String>,
}

impl TextChannel {
    /// Topic text, empty when the channel has none.
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or_default()
    }

    /// Mention syntax rendering as a clickable channel link.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// A message as stored in a channel's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub content: String,
}

/// A file uploaded alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Remote operations the bot relies on.
///
/// Calls are never retried; any failure is returned to the caller as is.
pub trait ChatPlatform: Send + Sync {
    /// Account the bot is authenticated as.
    fn current_user(&self) -> BoxFuture<'static, PlatformResult<BotUser>>;
    /// Guilds the bot is a member of.
    fn guilds(&self) -> BoxFuture<'static, PlatformResult<Vec<Guild>>>;
    /// Text channels of `guild`.
    fn text_channels(&self, guild: Guild) -> BoxFuture<'static, PlatformResult<Vec<TextChannel>>>;
    /// Fresh metadata for one channel.
    fn channel(&self, channel_id: Snowflake) -> BoxFuture<'static, PlatformResult<TextChannel>>;
    /// Full message history of a channel, oldest first.
    fn history(
        &self,
        channel_id: Snowflake,
    ) -> BoxFuture<'static, PlatformResult<Vec<ChannelMessage>>>;
    /// Post a new message.
    fn send(
        &self,
        channel_id: Snowflake,
        content: String,
    ) -> BoxFuture<'static, PlatformResult<ChannelMessage>>;
    /// Replace the content of an existing message.
    fn edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: String,
    ) -> BoxFuture<'static, PlatformResult<()>>;
    /// Delete a message.
    fn delete(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> BoxFuture<'static, PlatformResult<()>>;
    /// Open (or reuse) the direct-message channel with a user.
    fn dm_channel(&self, user_id: Snowflake) -> BoxFuture<'static, PlatformResult<Snowflake>>;
    /// React to a message with a unicode emoji.
    fn react(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    ) -> BoxFuture<'static, PlatformResult<()>>;
    /// Post a message carrying a file.
    fn upload(
        &self,
        channel_id: Snowflake,
        attachment: Attachment,
    ) -> BoxFuture<'static, PlatformResult<ChannelMessage>>;
}

/// Send `content` to `user_id` through their direct-message channel.
pub async fn direct_message(
    platform: &dyn ChatPlatform,
    user_id: Snowflake,
    content: String,
) -> PlatformResult<ChannelMessage> {
    let channel_id = platform.dm_channel(user_id).await?;
    platform.send(channel_id, content).await
}
