//! Prefix command handling for messages forwarded by the relay.
//!
//! [`handle_message`] is the single entry point: it parses the message, runs
//! the command against the services and reports failures back to the channel.

pub mod parser;
pub mod registry;
pub mod responses;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    dto::events::MessageEvent,
    error::ServiceError,
    platform::{PlatformError, direct_message},
    services::{admin_service, catalog_service, codec_service, sync_service},
    state::SharedState,
};

use self::{
    parser::Command,
    registry::{CommandSpec, help_text, lookup},
};

const ACK_EMOJI: &str = "👍";
const UNKNOWN_EMOJI: &str = "❓";

/// Why a command invocation failed, grouped by how it is reported.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{param} is a required argument that is missing")]
    MissingArgument { param: &'static str },
    #[error("too many arguments passed to {command}")]
    TooManyArguments { command: &'static str },
    #[error("{0}")]
    BadArgument(String),
    #[error("you do not own this bot")]
    NotOwner,
    #[error("{0}")]
    CheckFailure(String),
    #[error("command `{0}` is not found")]
    UnknownCommand(String),
    #[error(transparent)]
    Unexpected(ServiceError),
}

impl From<ServiceError> for CommandError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => CommandError::BadArgument(message),
            ServiceError::Busy => CommandError::CheckFailure(err.to_string()),
            ServiceError::Unauthorized(_) => CommandError::CheckFailure(err.to_string()),
            ServiceError::NotOwner => CommandError::NotOwner,
            other => CommandError::Unexpected(other),
        }
    }
}

impl From<PlatformError> for CommandError {
    fn from(err: PlatformError) -> Self {
        CommandError::Unexpected(ServiceError::Platform(err))
    }
}

/// Parse and run the command carried by `message`, if any.
///
/// Messages from bots and messages without the command prefix are ignored.
pub async fn handle_message(state: SharedState, message: MessageEvent) {
    if message.author.bot {
        return;
    }
    let prefix = state.config().command_prefix.clone();
    let Some((name, raw_args)) = parser::split_invocation(&prefix, &message.content) else {
        return;
    };

    let Some(spec) = lookup(name) else {
        let err = CommandError::UnknownCommand(name.to_string());
        report_failure(&state, &message, None, err).await;
        return;
    };

    debug!(command = spec.name, author = message.author.id, "running command");
    let outcome = match parser::parse_args(spec, raw_args) {
        Ok(command) => execute(&state, &message, command).await,
        Err(err) => Err(err),
    };
    if let Err(err) = outcome {
        report_failure(&state, &message, Some(spec), err).await;
    }
}

async fn execute(
    state: &SharedState,
    message: &MessageEvent,
    command: Command,
) -> Result<(), CommandError> {
    let platform = state.platform();
    let author = &message.author;

    match command {
        Command::Decode { code } => match codec_service::decode(&code) {
            Ok(text) => {
                direct_message(platform, author.id, format!("Decoded text: {text}")).await?;
                reply(state, message, "Done, check your dms.").await?;
            }
            Err(err) => {
                debug!(error = %err, "decode rejected");
                reply(state, message, "Not a valid base64 encoded string.").await?;
            }
        },
        Command::Encode { text } => {
            let encoded = codec_service::encode(&text);
            let sent = reply(state, message, &format!("<@{}>: {encoded}", author.id)).await;
            let deleted = platform.delete(message.channel_id, message.id).await;
            sent?;
            deleted?;
        }
        Command::AddGame { name } => {
            ensure_editor(state, message)?;
            let guard = state.try_begin_mutation()?;
            let position = catalog_service::add_game(state, &guard, &author.name, name).await?;
            reply(state, message, &format!("Added game {position}.")).await?;
        }
        Command::Rename {
            game_number,
            new_name,
        } => {
            ensure_editor(state, message)?;
            let guard = state.try_begin_mutation()?;
            catalog_service::rename_game(state, &guard, &author.name, game_number, new_name)
                .await?;
            acknowledge(state, message).await?;
        }
        Command::Edit(request) => {
            ensure_editor(state, message)?;
            let guard = state.try_begin_mutation()?;
            catalog_service::edit_attribute(state, &guard, &author.name, request).await?;
            acknowledge(state, message).await?;
        }
        Command::Sync => {
            ensure_editor(state, message)?;
            let guard = state.try_begin_mutation()?;
            sync_service::sync_all(state, &guard).await?;
            acknowledge(state, message).await?;
        }
        Command::Repair { channel_id } => {
            ensure_editor(state, message)?;
            let guard = state.try_begin_mutation()?;
            let posted = sync_service::repair(state, &guard, channel_id).await?;
            info!(channel = channel_id, posted, "channel repaired");
            acknowledge(state, message).await?;
        }
        Command::Backup => {
            ensure_owner(state, message)?;
            let guard = state.try_begin_mutation()?;
            admin_service::backup(state, &guard, message.channel_id).await?;
        }
        Command::Kill => {
            ensure_owner(state, message)?;
            let guard = state.try_begin_mutation()?;
            reply(state, message, ":pensive::gun:").await?;
            admin_service::shutdown(state, &guard);
        }
        Command::ClearDm => {
            let removed = admin_service::clear_dm(state, author.id).await?;
            debug!(removed, user = author.id, "cleared direct messages");
            acknowledge(state, message).await?;
        }
        Command::Help { topic } => {
            let prefix = &state.config().command_prefix;
            let text = help_text(prefix, topic.as_deref()).ok_or_else(|| {
                CommandError::BadArgument(format!(
                    "No command called \"{}\" found.",
                    topic.as_deref().unwrap_or_default()
                ))
            })?;
            reply(state, message, &text).await?;
        }
    }
    Ok(())
}

fn ensure_editor(state: &SharedState, message: &MessageEvent) -> Result<(), ServiceError> {
    let author = &message.author;
    if state.config().is_editor(author.id, &author.roles) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(format!(
            "{} may not edit the list",
            author.name
        )))
    }
}

fn ensure_owner(state: &SharedState, message: &MessageEvent) -> Result<(), ServiceError> {
    if state.config().is_owner(message.author.id) {
        Ok(())
    } else {
        Err(ServiceError::NotOwner)
    }
}

async fn reply(state: &SharedState, message: &MessageEvent, content: &str) -> Result<(), PlatformError> {
    state
        .platform()
        .send(message.channel_id, content.to_string())
        .await
        .map(|_| ())
}

async fn acknowledge(state: &SharedState, message: &MessageEvent) -> Result<(), PlatformError> {
    state
        .platform()
        .react(message.channel_id, message.id, ACK_EMOJI.to_string())
        .await
}

async fn report_failure(
    state: &SharedState,
    message: &MessageEvent,
    spec: Option<&CommandSpec>,
    err: CommandError,
) {
    let platform = state.platform();
    let prefix = &state.config().command_prefix;

    if let CommandError::UnknownCommand(name) = &err {
        debug!(command = %name, "unknown command");
        if let Err(react_err) = platform
            .react(message.channel_id, message.id, UNKNOWN_EMOJI.to_string())
            .await
        {
            warn!(error = %react_err, "failed to flag unknown command");
        }
        return;
    }

    match &err {
        CommandError::Unexpected(source) => {
            error!(error = %source, command = spec.map(|s| s.name), "command failed")
        }
        other => debug!(error = %other, command = spec.map(|s| s.name), "command rejected"),
    }

    if let Some(text) = responses::error_reply(&err, prefix, spec.map(|s| s.name))
        && let Err(send_err) = platform.send(message.channel_id, text).await
    {
        warn!(error = %send_err, "failed to report command error");
    }

    let owner_id = state.config().owner_id;
    if let CommandError::Unexpected(source) = &err
        && owner_id != 0
    {
        let report = responses::owner_report(source, prefix, message);
        if let Err(dm_err) = direct_message(platform, owner_id, report).await {
            warn!(error = %dm_err, "failed to forward error report to the owner");
        }
    }
}
