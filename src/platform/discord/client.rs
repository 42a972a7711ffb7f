use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::future::BoxFuture;
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::{AUTHORIZATION, RETRY_AFTER, USER_AGENT},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::platform::{
    Attachment, BotUser, ChannelMessage, ChatPlatform, Guild, Snowflake, TextChannel,
    error::{PlatformError, PlatformResult},
};

use super::{
    config::DiscordConfig,
    models::{
        ChannelPayload, CreateDmBody, GUILD_TEXT, GuildPayload, MessageBody, MessagePayload,
        RateLimitPayload, UserPayload,
    },
};

const HISTORY_PAGE_SIZE: usize = 100;
const CLIENT_USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/compat-list-bot, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
/// Consecutive 429 answers waited out before the status is surfaced.
const MAX_RATE_LIMIT_WAITS: u32 = 5;
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// [`ChatPlatform`] implementation over the Discord REST API.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    api_base: Arc<str>,
    token: Arc<str>,
    dm_channels: Arc<DashMap<Snowflake, Snowflake>>,
}

impl DiscordClient {
    /// Build the HTTP client. No request is made until the first call.
    pub fn new(config: DiscordConfig) -> PlatformResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| PlatformError::ClientBuilder { source })?;

        Ok(Self {
            client,
            api_base: Arc::<str>::from(config.api_base.trim_end_matches('/')),
            token: Arc::<str>::from(config.token),
            dm_channels: Arc::new(DashMap::new()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> PlatformResult<Url> {
        let invalid = || PlatformError::InvalidBaseUrl(self.api_base.to_string());
        let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        self.client
            .request(method, url.clone())
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .header(USER_AGENT, CLIENT_USER_AGENT)
    }

    /// Send the request produced by `build`, reissuing it while the API answers 429.
    ///
    /// `build` is called once per attempt since bodies (multipart forms in
    /// particular) cannot be replayed.
    async fn execute<F>(path: &str, mut build: F) -> PlatformResult<Response>
    where
        F: FnMut() -> RequestBuilder,
    {
        let mut waits = 0;
        loop {
            let response = build()
                .send()
                .await
                .map_err(|source| PlatformError::RequestSend {
                    path: path.to_string(),
                    source,
                })?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::TOO_MANY_REQUESTS && waits < MAX_RATE_LIMIT_WAITS {
                waits += 1;
                let delay = retry_after(response).await;
                warn!(path, ?delay, attempt = waits, "rate limited; waiting before reissuing request");
                tokio::time::sleep(delay).await;
                continue;
            }
            return Err(PlatformError::RequestStatus {
                path: path.to_string(),
                status,
            });
        }
    }

    async fn decode<T>(response: Response, path: &str) -> PlatformResult<T>
    where
        T: DeserializeOwned,
    {
        response
            .json::<T>()
            .await
            .map_err(|source| PlatformError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn get_json<T>(&self, segments: &[&str]) -> PlatformResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let response = Self::execute(&path, || self.request(Method::GET, &url)).await?;
        Self::decode(response, &path).await
    }

    async fn fetch_user(&self) -> PlatformResult<BotUser> {
        let user: UserPayload = self.get_json(&["users", "@me"]).await?;
        Ok(user.into())
    }

    async fn fetch_guilds(&self) -> PlatformResult<Vec<Guild>> {
        let guilds: Vec<GuildPayload> = self.get_json(&["users", "@me", "guilds"]).await?;
        Ok(guilds.into_iter().map(Into::into).collect())
    }

    async fn fetch_text_channels(&self, guild: Guild) -> PlatformResult<Vec<TextChannel>> {
        let guild_id = guild.id.to_string();
        let channels: Vec<ChannelPayload> =
            self.get_json(&["guilds", &guild_id, "channels"]).await?;
        Ok(channels
            .into_iter()
            .filter(|channel| channel.kind == GUILD_TEXT)
            .map(|channel| channel.into_text_channel(guild.name.clone()))
            .collect())
    }

    async fn fetch_channel(&self, channel_id: Snowflake) -> PlatformResult<TextChannel> {
        let id = channel_id.to_string();
        let payload: ChannelPayload = match self.get_json(&["channels", &id]).await {
            Err(PlatformError::RequestStatus { status, .. }) if status == StatusCode::NOT_FOUND => {
                return Err(PlatformError::UnknownChannel(channel_id));
            }
            other => other?,
        };

        let guild_name = match payload.guild_id {
            Some(guild_id) => {
                let guild_id = guild_id.to_string();
                let guild: GuildPayload = self.get_json(&["guilds", &guild_id]).await?;
                guild.name
            }
            None => String::new(),
        };
        Ok(payload.into_text_channel(guild_name))
    }

    async fn fetch_history(&self, channel_id: Snowflake) -> PlatformResult<Vec<ChannelMessage>> {
        let id = channel_id.to_string();
        let url = self.endpoint(&["channels", &id, "messages"])?;
        let path = url.path().to_string();
        let mut newest_first = Vec::new();
        let mut before: Option<Snowflake> = None;

        loop {
            let mut query = vec![("limit", HISTORY_PAGE_SIZE.to_string())];
            if let Some(before) = before {
                query.push(("before", before.to_string()));
            }

            let response =
                Self::execute(&path, || self.request(Method::GET, &url).query(&query)).await?;
            let page: Vec<MessagePayload> = Self::decode(response, &path).await?;

            let exhausted = page.len() < HISTORY_PAGE_SIZE;
            before = page.last().map(|message| message.id);
            newest_first.extend(page.into_iter().map(ChannelMessage::from));
            if exhausted || before.is_none() {
                break;
            }
        }

        debug!(channel_id, count = newest_first.len(), "fetched channel history");
        newest_first.reverse();
        Ok(newest_first)
    }

    async fn create_message(
        &self,
        channel_id: Snowflake,
        content: String,
    ) -> PlatformResult<ChannelMessage> {
        let id = channel_id.to_string();
        let url = self.endpoint(&["channels", &id, "messages"])?;
        let path = url.path().to_string();
        let body = MessageBody { content };
        let response = Self::execute(&path, || self.request(Method::POST, &url).json(&body)).await?;
        let message: MessagePayload = Self::decode(response, &path).await?;
        Ok(message.into())
    }

    async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: String,
    ) -> PlatformResult<()> {
        let (channel, message) = (channel_id.to_string(), message_id.to_string());
        let url = self.endpoint(&["channels", &channel, "messages", &message])?;
        let path = url.path().to_string();
        let body = MessageBody { content };
        Self::execute(&path, || self.request(Method::PATCH, &url).json(&body)).await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> PlatformResult<()> {
        let (channel, message) = (channel_id.to_string(), message_id.to_string());
        let url = self.endpoint(&["channels", &channel, "messages", &message])?;
        let path = url.path().to_string();
        match Self::execute(&path, || self.request(Method::DELETE, &url)).await {
            Err(PlatformError::RequestStatus { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(PlatformError::UnknownMessage {
                    channel_id,
                    message_id,
                })
            }
            other => other.map(|_| ()),
        }
    }

    async fn open_dm(&self, user_id: Snowflake) -> PlatformResult<Snowflake> {
        if let Some(channel_id) = self.dm_channels.get(&user_id) {
            return Ok(*channel_id);
        }

        let url = self.endpoint(&["users", "@me", "channels"])?;
        let path = url.path().to_string();
        let body = CreateDmBody {
            recipient_id: user_id,
        };
        let response = Self::execute(&path, || self.request(Method::POST, &url).json(&body)).await?;
        let channel: ChannelPayload = Self::decode(response, &path).await?;
        self.dm_channels.insert(user_id, channel.id);
        Ok(channel.id)
    }

    async fn add_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    ) -> PlatformResult<()> {
        let (channel, message) = (channel_id.to_string(), message_id.to_string());
        let url = self.endpoint(&[
            "channels", &channel, "messages", &message, "reactions", &emoji, "@me",
        ])?;
        let path = url.path().to_string();
        Self::execute(&path, || self.request(Method::PUT, &url)).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        channel_id: Snowflake,
        attachment: Attachment,
    ) -> PlatformResult<ChannelMessage> {
        let id = channel_id.to_string();
        let url = self.endpoint(&["channels", &id, "messages"])?;
        let path = url.path().to_string();
        let payload = json!({
            "attachments": [{ "id": 0, "filename": attachment.file_name }]
        })
        .to_string();

        let response = Self::execute(&path, || {
            let part = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
            let form = Form::new()
                .text("payload_json", payload.clone())
                .part("files[0]", part);
            self.request(Method::POST, &url).multipart(form)
        })
        .await?;
        let message: MessagePayload = Self::decode(response, &path).await?;
        Ok(message.into())
    }
}

/// Delay requested by a 429 answer: the `Retry-After` header, else the body's
/// `retry_after`, clamped to [`MAX_RETRY_AFTER`].
async fn retry_after(response: Response) -> Duration {
    let from_header = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<f64>().ok());
    let seconds = match from_header {
        Some(seconds) => Some(seconds),
        None => response
            .json::<RateLimitPayload>()
            .await
            .ok()
            .map(|body| body.retry_after),
    };

    seconds
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
        .min(MAX_RETRY_AFTER)
}

impl ChatPlatform for DiscordClient {
    fn current_user(&self) -> BoxFuture<'static, PlatformResult<BotUser>> {
        let this = self.clone();
        Box::pin(async move { this.fetch_user().await })
    }

    fn guilds(&self) -> BoxFuture<'static, PlatformResult<Vec<Guild>>> {
        let this = self.clone();
        Box::pin(async move { this.fetch_guilds().await })
    }

    fn text_channels(&self, guild: Guild) -> BoxFuture<'static, PlatformResult<Vec<TextChannel>>> {
        let this = self.clone();
        Box::pin(async move { this.fetch_text_channels(guild).await })
    }

    fn channel(&self, channel_id: Snowflake) -> BoxFuture<'static, PlatformResult<TextChannel>> {
        let this = self.clone();
        Box::pin(async move { this.fetch_channel(channel_id).await })
    }

    fn history(
        &self,
        channel_id: Snowflake,
    ) -> BoxFuture<'static, PlatformResult<Vec<ChannelMessage>>> {
        let this = self.clone();
        Box::pin(async move { this.fetch_history(channel_id).await })
    }

    fn send(
        &self,
        channel_id: Snowflake,
        content: String,
    ) -> BoxFuture<'static, PlatformResult<ChannelMessage>> {
        let this = self.clone();
        Box::pin(async move { this.create_message(channel_id, content).await })
    }

    fn edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: String,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let this = self.clone();
        Box::pin(async move { this.edit_message(channel_id, message_id, content).await })
    }

    fn delete(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let this = self.clone();
        Box::pin(async move { this.delete_message(channel_id, message_id).await })
    }

    fn dm_channel(&self, user_id: Snowflake) -> BoxFuture<'static, PlatformResult<Snowflake>> {
        let this = self.clone();
        Box::pin(async move { this.open_dm(user_id).await })
    }

    fn react(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: String,
    ) -> BoxFuture<'static, PlatformResult<()>> {
        let this = self.clone();
        Box::pin(async move { this.add_reaction(channel_id, message_id, emoji).await })
    }

    fn upload(
        &self,
        channel_id: Snowflake,
        attachment: Attachment,
    ) -> BoxFuture<'static, PlatformResult<ChannelMessage>> {
        let this = self.clone();
        Box::pin(async move { this.upload_file(channel_id, attachment).await })
    }
}
