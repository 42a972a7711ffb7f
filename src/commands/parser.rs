//! Prefix command parsing.
//!
//! Arguments are whitespace separated; the last free-text argument of a
//! command swallows the rest of the message verbatim (outer whitespace trimmed).

use crate::{platform::Snowflake, services::catalog_service::EditRequest};

use super::{
    CommandError,
    registry::{CommandKind, CommandSpec},
};

/// A fully parsed command ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Decode { code: String },
    Encode { text: String },
    AddGame { name: String },
    Rename { game_number: i64, new_name: String },
    Edit(EditRequest),
    Sync,
    Repair { channel_id: Snowflake },
    Backup,
    Kill,
    ClearDm,
    Help { topic: Option<String> },
}

/// Split `content` into the invoked name and its raw arguments, if it starts with `prefix`.
pub fn split_invocation<'a>(prefix: &str, content: &'a str) -> Option<(&'a str, &'a str)> {
    let body = content.strip_prefix(prefix)?;
    let end = body.find(char::is_whitespace).unwrap_or(body.len());
    let (name, rest) = body.split_at(end);
    if name.is_empty() {
        None
    } else {
        Some((name, rest))
    }
}

/// Parse the raw arguments of `spec`.
pub fn parse_args(spec: &CommandSpec, raw: &str) -> Result<Command, CommandError> {
    let mut args = Arguments { rest: raw };
    let command = match spec.kind {
        CommandKind::Decode => Command::Decode {
            code: args.remainder("code")?,
        },
        CommandKind::Encode => Command::Encode {
            text: args.remainder("text")?,
        },
        CommandKind::AddGame => Command::AddGame {
            name: args.remainder("gamename")?,
        },
        CommandKind::Rename => Command::Rename {
            game_number: args.integer("game_number")?,
            new_name: args.remainder("new_name")?,
        },
        CommandKind::Edit => Command::Edit(EditRequest {
            game_number: args.integer("game_number")?,
            category: args.word("category")?.to_string(),
            attribute_number: args.integer("attribute_num")?,
            text: args.remainder("text")?,
        }),
        CommandKind::Sync => args.finish(spec, Command::Sync)?,
        CommandKind::Repair => {
            let channel_id = args.channel("channel")?;
            args.finish(spec, Command::Repair { channel_id })?
        }
        CommandKind::Backup => args.finish(spec, Command::Backup)?,
        CommandKind::Kill => args.finish(spec, Command::Kill)?,
        CommandKind::ClearDm => args.finish(spec, Command::ClearDm)?,
        CommandKind::Help => {
            let topic = args.optional_word().map(str::to_string);
            args.finish(spec, Command::Help { topic })?
        }
    };
    Ok(command)
}

struct Arguments<'a> {
    rest: &'a str,
}

impl<'a> Arguments<'a> {
    fn optional_word(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (word, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(word)
    }

    fn word(&mut self, param: &'static str) -> Result<&'a str, CommandError> {
        self.optional_word()
            .ok_or(CommandError::MissingArgument { param })
    }

    fn integer(&mut self, param: &'static str) -> Result<i64, CommandError> {
        let word = self.word(param)?;
        word.parse().map_err(|_| {
            CommandError::BadArgument(format!(
                "Converting to \"int\" failed for parameter \"{param}\"."
            ))
        })
    }

    fn channel(&mut self, param: &'static str) -> Result<Snowflake, CommandError> {
        let word = self.word(param)?;
        let id = word
            .strip_prefix("<#")
            .and_then(|inner| inner.strip_suffix('>'))
            .unwrap_or(word);
        id.parse()
            .map_err(|_| CommandError::BadArgument(format!("Channel \"{word}\" not found.")))
    }

    fn remainder(self, param: &'static str) -> Result<String, CommandError> {
        let text = self.rest.trim();
        if text.is_empty() {
            Err(CommandError::MissingArgument { param })
        } else {
            Ok(text.to_string())
        }
    }

    fn finish(self, spec: &CommandSpec, command: Command) -> Result<Command, CommandError> {
        if self.rest.trim().is_empty() {
            Ok(command)
        } else {
            Err(CommandError::TooManyArguments { command: spec.name })
        }
    }
}
