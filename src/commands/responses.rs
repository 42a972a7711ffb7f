//! User-facing rendering of command failures.

use std::error::Error as StdError;

use crate::{dto::events::MessageEvent, error::ServiceError};

use super::CommandError;

/// Reply posted in the invoking channel, or `None` when the failure is signalled otherwise.
pub fn error_reply(error: &CommandError, prefix: &str, command: Option<&str>) -> Option<String> {
    let usage_hint = match command {
        Some(name) => format!("Run `{prefix}help {name}` for more details on command usage."),
        None => format!("Run `{prefix}help` for instructions."),
    };

    let text = match error {
        CommandError::UnknownCommand(_) => return None,
        CommandError::MissingArgument { param } => format!(
            "You're missing a required parameter.\n{usage_hint}\n\nMore information:\n\
             Parameter: `{param}`\nRaw error: `{param} is a required argument that is missing.`"
        ),
        CommandError::TooManyArguments { command } => format!(
            "You've got too many arguments.\n{usage_hint}\n\nMore information:\n\
             Raw error: `Too many arguments passed to {command}`"
        ),
        CommandError::BadArgument(raw) => format!(
            "One of your arguments was incorrect.\n{usage_hint}\n\nMore information:\n\
             Raw error: `{raw}`"
        ),
        CommandError::NotOwner => format!(
            "That command is only available for the bot owner.\n{usage_hint}\n\n\
             More information:\nRaw error: `You do not own this bot.`"
        ),
        CommandError::CheckFailure(raw) => format!(
            "Either the database is in use, or you don't have access to this command.\n\
             Run `{prefix}help` to see which commands you can use.\n\n\
             More information:\nRaw error: `{raw}`"
        ),
        CommandError::Unexpected(source) => unexpected_reply(source, prefix),
    };
    Some(text)
}

/// Report forwarded to the bot owner for failures nobody anticipated.
pub fn owner_report(error: &ServiceError, prefix: &str, message: &MessageEvent) -> String {
    format!(
        "{}\n{}\nOriginal message by {} (<@{}>):\n{}",
        unexpected_reply(error, prefix),
        message.jump_link(),
        message.author.name,
        message.author.id,
        message.content
    )
}

fn unexpected_reply(error: &ServiceError, prefix: &str) -> String {
    format!(
        "An error occurred.\nRun `{prefix}help` for instructions.\n\n\
         More information:\nError type: `{}`\nRaw error: `{}`",
        error_kind(error),
        error_chain(error)
    )
}

fn error_kind(error: &ServiceError) -> &'static str {
    match error {
        ServiceError::Storage(_) => "StorageError",
        ServiceError::Platform(_) => "PlatformError",
        ServiceError::InvalidInput(_) => "InvalidInput",
        ServiceError::Busy => "Busy",
        ServiceError::Unauthorized(_) => "Unauthorized",
        ServiceError::NotOwner => "NotOwner",
    }
}

fn error_chain(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
