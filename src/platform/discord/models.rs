//! Wire representations of the Discord REST payloads the client touches.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::platform::{BotUser, ChannelMessage, Guild, Snowflake, TextChannel};

/// Channel type code of a regular guild text channel.
pub const GUILD_TEXT: u8 = 0;

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    #[serde_as(as = "DisplayFromStr")]
    pub id: Snowflake,
    pub username: String,
}

impl From<UserPayload> for BotUser {
    fn from(value: UserPayload) -> Self {
        Self {
            id: value.id,
            name: value.username,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct GuildPayload {
    #[serde_as(as = "DisplayFromStr")]
    pub id: Snowflake,
    pub name: String,
}

impl From<GuildPayload> for Guild {
    fn from(value: GuildPayload) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct ChannelPayload {
    #[serde_as(as = "DisplayFromStr")]
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl ChannelPayload {
    /// Convert into the platform-neutral channel, attaching the guild name resolved separately.
    pub fn into_text_channel(self, guild_name: String) -> TextChannel {
        TextChannel {
            id: self.id,
            guild_id: self.guild_id,
            guild_name,
            name: self.name.unwrap_or_default(),
            topic: self.topic,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    #[serde_as(as = "DisplayFromStr")]
    pub id: Snowflake,
    #[serde_as(as = "DisplayFromStr")]
    pub channel_id: Snowflake,
    pub author: UserPayload,
    #[serde(default)]
    pub content: String,
}

impl From<MessagePayload> for ChannelMessage {
    fn from(value: MessagePayload) -> Self {
        Self {
            id: value.id,
            channel_id: value.channel_id,
            author_id: value.author.id,
            content: value.content,
        }
    }
}

/// Body of message create and edit requests.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub content: String,
}

/// Body of the "create DM" request.
#[serde_as]
#[derive(Debug, Serialize)]
pub struct CreateDmBody {
    #[serde_as(as = "DisplayFromStr")]
    pub recipient_id: Snowflake,
}

/// Body of a `429 Too Many Requests` answer.
#[derive(Debug, Deserialize)]
pub struct RateLimitPayload {
    /// Seconds to wait before reissuing the request.
    pub retry_after: f64,
}
