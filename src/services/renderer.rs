//! Text projection of records as posted in list channels.

use std::fmt::Write;

use crate::dao::models::{Category, Record};

/// Content of the filler messages sent while a channel is being padded to the record count.
pub const PLACEHOLDER_MESSAGE: &str =
    "```diff\n- Placeholder. Please hold. If this persists for 2 minutes, ping the bot owner.\n```";

const EMPTY_SECTION: &str = "* None\n";

/// Render `record` as the list message shown at 1-based `position`.
pub fn render(record: &Record, position: usize) -> String {
    let mut message = String::from("```markdown\n");
    let _ = writeln!(message, "[{position:03}]: {}", record.name);

    for category in Category::ALL {
        message.push('\n');
        let _ = writeln!(message, "# {}", category.heading());
        message.push_str(&numbered_list(record.attributes(category)));
    }

    message.push_str("```");
    message
}

fn numbered_list(entries: &[String]) -> String {
    if entries.is_empty() {
        return EMPTY_SECTION.to_string();
    }

    entries
        .iter()
        .enumerate()
        .fold(String::new(), |mut out, (index, entry)| {
            let _ = writeln!(out, "{}. {entry}", index + 1);
            out
        })
}
