//! Payloads exchanged with the gateway relay.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::platform::Snowflake;

/// A message created in a channel visible to the bot, as forwarded by the relay.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageEvent {
    #[serde_as(as = "DisplayFromStr")]
    #[validate(range(min = 1))]
    pub id: Snowflake,
    #[serde_as(as = "DisplayFromStr")]
    #[validate(range(min = 1))]
    pub channel_id: Snowflake,
    /// Absent for direct messages.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[validate(nested)]
    pub author: EventAuthor,
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

impl MessageEvent {
    /// Link that jumps to the message in the client.
    pub fn jump_link(&self) -> String {
        let guild = self
            .guild_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "@me".to_string());
        format!(
            "https://discord.com/channels/{guild}/{}/{}",
            self.channel_id, self.id
        )
    }
}

/// Author of a [`MessageEvent`].
#[serde_as]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventAuthor {
    #[serde_as(as = "DisplayFromStr")]
    #[validate(range(min = 1))]
    pub id: Snowflake,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub bot: bool,
    /// Role ids of the author in the guild the message was posted in.
    #[serde_as(as = "Vec<DisplayFromStr>")]
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

/// Acknowledgement returned to the relay.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EventAck {
    /// Whether the message was handed to the command layer.
    pub accepted: bool,
}
