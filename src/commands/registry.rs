//! Static command table, also the source of the `help` output.

/// Which parser and handler a command maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Decode,
    Encode,
    AddGame,
    Rename,
    Edit,
    Sync,
    Repair,
    Backup,
    Kill,
    ClearDm,
    Help,
}

/// Name, aliases and help texts of one command.
#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: CommandKind,
    pub usage: &'static str,
    pub brief: &'static str,
    pub help: &'static str,
}

/// Every command the bot answers to, in help order.
pub static COMMANDS: [CommandSpec; 11] = [
    CommandSpec {
        name: "decode",
        aliases: &["d"],
        kind: CommandKind::Decode,
        usage: "<code>",
        brief: "Decodes a base64 string and DMs you the result",
        help: "Decodes a base64 encoded string and sends the decoded text in a direct message.",
    },
    CommandSpec {
        name: "encode",
        aliases: &["e"],
        kind: CommandKind::Encode,
        usage: "<text>",
        brief: "Encodes text as base64",
        help: "Encodes the given text as base64, posts it and deletes your message.",
    },
    CommandSpec {
        name: "add_game",
        aliases: &[],
        kind: CommandKind::AddGame,
        usage: "<gamename>",
        brief: "Adds a game to the list",
        help: "Adds a game without any attributes to the compatibility list.",
    },
    CommandSpec {
        name: "rename",
        aliases: &[],
        kind: CommandKind::Rename,
        usage: "<game_number> <new_name>",
        brief: "Renames a game",
        help: "Renames the game shown with the given number in the list channels.",
    },
    CommandSpec {
        name: "edit",
        aliases: &[],
        kind: CommandKind::Edit,
        usage: "<game_number> <category> <attribute_num> <text>",
        brief: "Adds, edits or removes a game attribute",
        help: "Edits attribute <attribute_num> of <category> for a game.\n\
               Use the next free number to add an attribute and `delete` as text to remove one.\n\
               Categories: functional, broken, crashes, recommendedsettings, notes.",
    },
    CommandSpec {
        name: "sync",
        aliases: &[],
        kind: CommandKind::Sync,
        usage: "",
        brief: "Resyncs the list channels",
        help: "Sorts the game list and brings every list channel up to date.",
    },
    CommandSpec {
        name: "repair",
        aliases: &[],
        kind: CommandKind::Repair,
        usage: "<channel>",
        brief: "Rebuilds a list channel from scratch",
        help: "Deletes every message in the channel, whoever posted it, and posts the whole list again.",
    },
    CommandSpec {
        name: "backup",
        aliases: &[],
        kind: CommandKind::Backup,
        usage: "",
        brief: "Uploads the game database",
        help: "Uploads the current game database file into this channel.",
    },
    CommandSpec {
        name: "kill",
        aliases: &[],
        kind: CommandKind::Kill,
        usage: "",
        brief: "Shuts the bot down",
        help: "Stops the bot process.",
    },
    CommandSpec {
        name: "clear_dm",
        aliases: &[],
        kind: CommandKind::ClearDm,
        usage: "",
        brief: "Clears the bot's DMs to you",
        help: "Deletes every message the bot sent you in direct messages.",
    },
    CommandSpec {
        name: "help",
        aliases: &[],
        kind: CommandKind::Help,
        usage: "[command]",
        brief: "Shows this message",
        help: "Shows the command list, or details about one command.",
    },
];

/// Find a command by name or alias. Matching is case-sensitive.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.contains(&name))
}

/// `help` output for all commands, or for `topic` when given.
pub fn help_text(prefix: &str, topic: Option<&str>) -> Option<String> {
    let Some(topic) = topic else {
        let mut text = String::from("```\n");
        for spec in &COMMANDS {
            text.push_str(&format!("{prefix}{:<10} {}\n", spec.name, spec.brief));
        }
        text.push_str(&format!(
            "```\nType `{prefix}help <command>` for more info on a command."
        ));
        return Some(text);
    };

    let spec = lookup(topic)?;
    let mut text = format!("```\n{prefix}{} {}", spec.name, spec.usage)
        .trim_end()
        .to_string();
    text.push_str(&format!("\n\n{}\n", spec.help));
    if !spec.aliases.is_empty() {
        text.push_str(&format!("\nAliases: {}\n", spec.aliases.join(", ")));
    }
    text.push_str("```");
    Some(text)
}
