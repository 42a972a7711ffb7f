//! Record mutations behind the `add_game`, `rename` and `edit` commands.
//!
//! Each operation validates its arguments against the freshly loaded store
//! before touching it, persists, writes an audit entry and then resyncs the
//! list channels, all under the caller's [`MutationGuard`].

use tracing::info;

use crate::{
    dao::models::{Category, Record},
    error::ServiceError,
    services::{audit_service, sync_service},
    state::{MutationGuard, SharedState},
};

/// Arguments of the `edit` command as typed by the user (1-based indices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub game_number: i64,
    pub category: String,
    pub attribute_number: i64,
    pub text: String,
}

/// Change applied to one attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChange {
    Added { text: String },
    Removed { old: String },
    Updated { old: String, new: String },
}

/// A validated and applied `edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEdit {
    pub game: String,
    pub category: Category,
    pub change: AttributeChange,
}

impl AttributeEdit {
    /// Human-readable diff block for the log channels.
    pub fn audit_entry(&self, author: &str) -> String {
        let (verb, lines) = match &self.change {
            AttributeChange::Added { text } => ("added", format!("+ {text}")),
            AttributeChange::Removed { old } => ("removed", format!("- {old}")),
            AttributeChange::Updated { old, new } => ("updated", format!("- {old}\n+ {new}")),
        };
        format!(
            "```diff\nAttribute in \"{}\" {verb} for {}:\n{lines}\n@{author}\n```",
            self.category, self.game
        )
    }
}

/// A validated and applied `rename`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub old: String,
    pub new: String,
}

impl Rename {
    pub fn audit_entry(&self, author: &str) -> String {
        format!(
            "```diff\nRenamed game:\n- {}\n+ {}\n@{author}\n```",
            self.old, self.new
        )
    }
}

/// Append a new, attribute-less record, resync, and return its 1-based list position.
pub async fn add_game(
    state: &SharedState,
    guard: &MutationGuard<'_>,
    author: &str,
    name: String,
) -> Result<usize, ServiceError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "gamename is a required parameter.".into(),
        ));
    }

    let record = Record::new(name.clone());
    state
        .store()
        .modify(|records| {
            records.push(record.clone());
            Ok::<_, ServiceError>(())
        })
        .await?;
    info!(game = %name, "added game");

    audit_service::record(state, format!("```diff\nAdded game:\n+ {name}\n@{author}\n```")).await?;
    sync_service::sync_all(state, guard).await?;

    let records = state.store().read().await?;
    let position = records
        .iter()
        .rposition(|candidate| *candidate == record)
        .map(|index| index + 1)
        .unwrap_or(records.len());
    Ok(position)
}

/// Rename the record shown at `game_number` and resync.
pub async fn rename_game(
    state: &SharedState,
    guard: &MutationGuard<'_>,
    author: &str,
    game_number: i64,
    new_name: String,
) -> Result<Rename, ServiceError> {
    let rename = state
        .store()
        .modify(|records| apply_rename(records, game_number, &new_name))
        .await?;
    info!(old = %rename.old, new = %rename.new, "renamed game");

    audit_service::record(state, rename.audit_entry(author)).await?;
    sync_service::sync_all(state, guard).await?;
    Ok(rename)
}

/// Add, update or delete one attribute and resync.
pub async fn edit_attribute(
    state: &SharedState,
    guard: &MutationGuard<'_>,
    author: &str,
    request: EditRequest,
) -> Result<AttributeEdit, ServiceError> {
    let edit = state
        .store()
        .modify(|records| apply_edit(records, &request))
        .await?;
    info!(
        game = %edit.game,
        category = %edit.category,
        attribute = request.attribute_number,
        "attribute modified"
    );

    audit_service::record(state, edit.audit_entry(author)).await?;
    sync_service::sync_all(state, guard).await?;
    Ok(edit)
}

/// Validate `request` against `records` and apply it. Nothing is mutated on error.
pub fn apply_edit(records: &mut [Record], request: &EditRequest) -> Result<AttributeEdit, ServiceError> {
    let index = game_index(records, request.game_number)?;
    let category = request.category.parse::<Category>().map_err(|_| {
        ServiceError::InvalidInput(format!(
            "category must be one of {}",
            Category::valid_keys()
        ))
    })?;

    let record = &mut records[index];
    let game = record.name.clone();
    let attributes = record.attributes_mut(category);
    let append_slot = attributes.len() as i64 + 1;
    if !(1..=append_slot).contains(&request.attribute_number) {
        return Err(ServiceError::InvalidInput(format!(
            "attribute_num must be between 1 and {append_slot} inclusive."
        )));
    }

    let text = request.text.trim();
    if text.is_empty() {
        return Err(ServiceError::InvalidInput(
            "text is a required parameter. If you intended to delete the attribute, use \"delete\"."
                .into(),
        ));
    }
    let is_delete = text.eq_ignore_ascii_case("delete");
    let slot = (request.attribute_number - 1) as usize;

    let change = if request.attribute_number == append_slot {
        if is_delete {
            return Err(ServiceError::InvalidInput(
                "You cannot simultaneously create and delete an attribute.".into(),
            ));
        }
        attributes.push(text.to_string());
        AttributeChange::Added {
            text: text.to_string(),
        }
    } else if is_delete {
        AttributeChange::Removed {
            old: attributes.remove(slot),
        }
    } else {
        let old = std::mem::replace(&mut attributes[slot], text.to_string());
        AttributeChange::Updated {
            old,
            new: text.to_string(),
        }
    };

    Ok(AttributeEdit {
        game,
        category,
        change,
    })
}

/// Validate and apply a rename. Nothing is mutated on error.
pub fn apply_rename(
    records: &mut [Record],
    game_number: i64,
    new_name: &str,
) -> Result<Rename, ServiceError> {
    let index = game_index(records, game_number)?;
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "new_name is a required parameter.".into(),
        ));
    }

    let old = std::mem::replace(&mut records[index].name, new_name.to_string());
    Ok(Rename {
        old,
        new: new_name.to_string(),
    })
}

fn game_index(records: &[Record], game_number: i64) -> Result<usize, ServiceError> {
    if (1..=records.len() as i64).contains(&game_number) {
        Ok((game_number - 1) as usize)
    } else {
        Err(ServiceError::InvalidInput(format!(
            "game_number must be between 1 and {} inclusive.",
            records.len()
        )))
    }
}
