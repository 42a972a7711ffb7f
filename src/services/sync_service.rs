//! Mirrors the record store into every list channel.
//!
//! A pass aligns messages and records purely by index: `message[i]` shows
//! `records[i]` once the pass completes. Only a count mismatch that survives the
//! length adjustment (someone else posting or deleting mid-pass) falls back to
//! the destructive rebuild, and only for the channel where it happened.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{Record, sort_records},
        storage::StorageError,
    },
    error::ServiceError,
    platform::{
        ChannelMessage, ChatPlatform, PlatformError, PlatformResult, Snowflake, TextChannel,
        direct_message,
    },
    services::renderer::{PLACEHOLDER_MESSAGE, render},
    state::{
        MutationGuard, SharedState,
        channels::{LIST_MARKER, reprimands_enabled},
    },
};

/// What one pass did to one channel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel_id: Snowflake,
    /// Messages by other authors that were deleted.
    pub foreign_removed: usize,
    /// Distinct authors warned by DM.
    pub reprimanded: usize,
    /// Surplus bot messages deleted from the tail.
    pub trimmed: usize,
    /// Placeholder messages sent to reach the record count.
    pub padded: usize,
    /// Messages whose content was replaced.
    pub edited: usize,
    /// Whether the channel had to be rebuilt from scratch.
    pub rebuilt: bool,
}

/// Outcome of a full synchronization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub records: usize,
    pub channels: Vec<ChannelReport>,
}

/// Sort the store by name, persist that order, then reconcile every list channel.
pub async fn sync_all(
    state: &SharedState,
    _guard: &MutationGuard<'_>,
) -> Result<SyncReport, ServiceError> {
    let records = state
        .store()
        .modify(|records| {
            sort_records(records);
            Ok::<_, StorageError>(records.clone())
        })
        .await?;

    let mut report = SyncReport {
        records: records.len(),
        channels: Vec::new(),
    };
    for channel in state.channels().list_channels() {
        report
            .channels
            .push(reconcile_channel(state, &channel, &records).await?);
    }

    info!(
        records = report.records,
        channels = report.channels.len(),
        "list channels synchronized"
    );
    Ok(report)
}

/// Bring one channel in line with `records`, doing as few remote writes as possible.
pub async fn reconcile_channel(
    state: &SharedState,
    channel: &TextChannel,
    records: &[Record],
) -> Result<ChannelReport, ServiceError> {
    let platform = state.platform();
    let bot_id = state.bot_user().id;
    let channel = platform.channel(channel.id).await?;
    let mut report = ChannelReport {
        channel_id: channel.id,
        ..ChannelReport::default()
    };
    info!(channel = %channel.name, guild = %channel.guild_name, "syncing list channel");

    let history = platform.history(channel.id).await?;
    let reprimand = reprimands_enabled(channel.topic());
    let mut warned = HashSet::new();
    let mut foreign = Vec::new();
    for message in history.into_iter().filter(|m| m.author_id != bot_id) {
        if reprimand && warned.insert(message.author_id) {
            let warning = format!(
                "Please don't send messages in `#{}` in `{}`. It'll break things.",
                channel.name, channel.guild_name
            );
            match direct_message(platform, message.author_id, warning).await {
                Ok(_) => report.reprimanded += 1,
                Err(err) => warn!(
                    author = message.author_id,
                    error = %err,
                    "could not deliver reprimand"
                ),
            }
        }
        foreign.push(message);
    }

    // Deleting only after the scan keeps the history indices stable while scanning.
    for message in &foreign {
        if delete_if_present(platform, channel.id, message.id).await? {
            report.foreign_removed += 1;
        }
    }

    let mut messages = bot_messages(platform, channel.id, bot_id).await?;
    while messages.len() > records.len() {
        let Some(surplus) = messages.pop() else { break };
        if delete_if_present(platform, channel.id, surplus.id).await? {
            report.trimmed += 1;
        }
    }
    while messages.len() < records.len() {
        let placeholder = platform
            .send(channel.id, PLACEHOLDER_MESSAGE.to_string())
            .await?;
        messages.push(placeholder);
        report.padded += 1;
    }

    let messages = bot_messages(platform, channel.id, bot_id).await?;
    if messages.len() != records.len() {
        warn!(
            channel = %channel.name,
            messages = messages.len(),
            records = records.len(),
            "message count still differs after adjustment; rebuilding channel"
        );
        rebuild_channel(state, &channel, records).await?;
        report.rebuilt = true;
        return Ok(report);
    }

    for (index, (message, record)) in messages.iter().zip(records).enumerate() {
        let content = render(record, index + 1);
        if message.content != content {
            platform.edit(channel.id, message.id, content).await?;
            report.edited += 1;
        }
    }

    debug!(?report, "channel reconciled");
    Ok(report)
}

/// Delete everything in `channel` and post one freshly rendered message per record.
pub async fn rebuild_channel(
    state: &SharedState,
    channel: &TextChannel,
    records: &[Record],
) -> Result<usize, ServiceError> {
    let platform = state.platform();
    warn!(channel = %channel.name, guild = %channel.guild_name, "rebuilding list channel");

    for message in platform.history(channel.id).await? {
        platform.delete(channel.id, message.id).await?;
    }
    for (index, record) in records.iter().enumerate() {
        platform.send(channel.id, render(record, index + 1)).await?;
    }
    Ok(records.len())
}

/// User-facing rebuild of one channel, which must carry the list marker.
///
/// A channel that passes the check is registered as a list channel from now on.
pub async fn repair(
    state: &SharedState,
    _guard: &MutationGuard<'_>,
    channel_id: Snowflake,
) -> Result<usize, ServiceError> {
    let channel = state.platform().channel(channel_id).await?;
    if !channel.topic().contains(LIST_MARKER) {
        return Err(ServiceError::InvalidInput(format!(
            "#{} is not a valid list channel.",
            channel.name
        )));
    }
    if !state.channels().is_list_channel(channel.id) {
        state.channels().add_list_channel(channel.clone());
    }

    let records = state.store().read().await?;
    rebuild_channel(state, &channel, &records).await
}

/// Delete a message, treating one that is already gone as removed.
///
/// Returns whether this call did the deletion.
async fn delete_if_present(
    platform: &dyn ChatPlatform,
    channel_id: Snowflake,
    message_id: Snowflake,
) -> PlatformResult<bool> {
    match platform.delete(channel_id, message_id).await {
        Ok(()) => Ok(true),
        Err(PlatformError::UnknownMessage { .. }) => {
            debug!(channel_id, message_id, "message already removed");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

async fn bot_messages(
    platform: &dyn ChatPlatform,
    channel_id: Snowflake,
    bot_id: Snowflake,
) -> PlatformResult<Vec<ChannelMessage>> {
    let history = platform.history(channel_id).await?;
    Ok(history
        .into_iter()
        .filter(|message| message.author_id == bot_id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        platform::memory::{BOT_ID, CallCounts, MemoryPlatform},
        state::test_support::{seed_records, state_with},
    };

    const LIST: Snowflake = 500;

    async fn list_setup(
        names: &[&str],
        topic: &str,
    ) -> (MemoryPlatform, SharedState, tempfile::TempDir) {
        let platform = MemoryPlatform::new();
        let channel = platform.add_channel(LIST, "compat-list", Some(topic));
        let (state, dir) = state_with(&platform).await;
        state.channels().add_list_channel(channel);
        seed_records(&state, names).await;
        (platform, state, dir)
    }

    fn expected_contents(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| render(record, index + 1))
            .collect()
    }

    #[tokio::test]
    async fn sync_sorts_store_and_fills_empty_channel() {
        let (platform, state, _dir) = list_setup(&["Zelda", "Mario"], LIST_MARKER).await;

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        let records = state.store().read().await.unwrap();
        let names = records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Mario", "Zelda"]);

        assert_eq!(platform.contents(LIST), expected_contents(&records));
        assert!(platform.contents(LIST)[0].contains("[001]: Mario"));
        assert_eq!(report.channels[0].padded, 2);
        assert_eq!(report.channels[0].edited, 2);
    }

    #[tokio::test]
    async fn second_pass_without_changes_issues_no_writes() {
        let (platform, state, _dir) = list_setup(&["Mario", "Kirby", "Zelda"], LIST_MARKER).await;
        let guard = state.try_begin_mutation().unwrap();
        sync_all(&state, &guard).await.unwrap();
        platform.reset_calls();

        let report = sync_all(&state, &guard).await.unwrap();

        assert_eq!(platform.calls(), CallCounts::default());
        assert_eq!(
            report.channels[0],
            ChannelReport {
                channel_id: LIST,
                ..ChannelReport::default()
            }
        );
    }

    #[tokio::test]
    async fn surplus_messages_are_removed_from_the_tail() {
        let (platform, state, _dir) = list_setup(&["Mario", "Zelda"], LIST_MARKER).await;
        let ids = (0..4)
            .map(|n| platform.seed(LIST, BOT_ID, &format!("old {n}")))
            .collect::<Vec<_>>();

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        assert_eq!(platform.deleted(), vec![ids[3], ids[2]]);
        let remaining = platform
            .messages(LIST)
            .iter()
            .map(|m| m.id)
            .collect::<Vec<_>>();
        assert_eq!(remaining, vec![ids[0], ids[1]]);
        let records = state.store().read().await.unwrap();
        assert_eq!(platform.contents(LIST), expected_contents(&records));
        assert_eq!(report.channels[0].trimmed, 2);
    }

    #[tokio::test]
    async fn foreign_messages_are_deleted_and_authors_warned_once() {
        let (platform, state, _dir) = list_setup(&["Mario"], LIST_MARKER).await;
        platform.seed(LIST, 42, "hi");
        platform.seed(LIST, BOT_ID, "stale");
        platform.seed(LIST, 42, "hello?");
        platform.seed(LIST, 43, "me too");

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        let channel = &report.channels[0];
        assert_eq!(channel.foreign_removed, 3);
        assert_eq!(channel.reprimanded, 2);
        assert_eq!(platform.dms_to(42).len(), 1);
        assert!(platform.dms_to(42)[0].contains("`#compat-list` in `Emu Hub`"));
        assert_eq!(platform.dms_to(43).len(), 1);
        assert!(platform.messages(LIST).iter().all(|m| m.author_id == BOT_ID));
        assert_eq!(platform.messages(LIST).len(), 1);
    }

    #[tokio::test]
    async fn no_reprimand_marker_suppresses_warnings() {
        let topic = format!("{LIST_MARKER} <yuzu-compat: noreprimand>");
        let (platform, state, _dir) = list_setup(&["Mario"], &topic).await;
        platform.seed(LIST, 42, "hi");

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        assert_eq!(report.channels[0].foreign_removed, 1);
        assert_eq!(report.channels[0].reprimanded, 0);
        assert!(platform.dms_to(42).is_empty());
    }

    #[tokio::test]
    async fn undeliverable_reprimand_does_not_stop_the_pass() {
        let (platform, state, _dir) = list_setup(&["Mario"], LIST_MARKER).await;
        platform.disable_direct_messages();
        platform.seed(LIST, 42, "hi");

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        assert_eq!(report.channels[0].foreign_removed, 1);
        assert_eq!(report.channels[0].reprimanded, 0);
        let records = state.store().read().await.unwrap();
        assert_eq!(platform.contents(LIST), expected_contents(&records));
    }

    #[tokio::test]
    async fn message_removed_mid_pass_does_not_abort_other_channels() {
        let (platform, state, _dir) = list_setup(&["Mario", "Zelda"], LIST_MARKER).await;
        let second = platform.add_channel(501, "compat-list-2", Some(LIST_MARKER));
        state.channels().add_list_channel(second);
        let chatter = platform.seed(LIST, 42, "hi");
        platform.vanish_before_delete(chatter);

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        assert_eq!(report.channels.len(), 2);
        assert_eq!(report.channels[0].foreign_removed, 0);
        let records = state.store().read().await.unwrap();
        assert_eq!(platform.contents(LIST), expected_contents(&records));
        assert_eq!(platform.contents(501), expected_contents(&records));
    }

    #[tokio::test]
    async fn concurrent_interference_falls_back_to_rebuild() {
        let (platform, state, _dir) = list_setup(&["Mario", "Zelda"], LIST_MARKER).await;
        platform.interfere_on_next_send(LIST);

        let guard = state.try_begin_mutation().unwrap();
        let report = sync_all(&state, &guard).await.unwrap();

        assert!(report.channels[0].rebuilt);
        let records = state.store().read().await.unwrap();
        assert_eq!(platform.contents(LIST), expected_contents(&records));
    }

    #[tokio::test]
    async fn rebuild_replaces_any_prior_content() {
        let (platform, state, _dir) = list_setup(&["Mario", "Zelda", "Kirby"], LIST_MARKER).await;
        platform.seed(LIST, 42, "chatter");
        platform.seed(LIST, BOT_ID, "something stale");

        let records = state.store().read().await.unwrap();
        let channel = platform.add_channel(LIST, "compat-list", Some(LIST_MARKER));
        let sent = rebuild_channel(&state, &channel, &records).await.unwrap();

        assert_eq!(sent, 3);
        assert_eq!(platform.contents(LIST), expected_contents(&records));
    }

    #[tokio::test]
    async fn repair_refuses_channels_without_list_marker() {
        let (platform, state, _dir) = list_setup(&["Mario"], LIST_MARKER).await;
        platform.add_channel(600, "general", Some("chat about games"));

        let guard = state.try_begin_mutation().unwrap();
        let err = repair(&state, &guard, 600).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidInput(ref msg) if msg == "#general is not a valid list channel.")
        );
        assert!(!state.channels().is_list_channel(600));
    }

    #[tokio::test]
    async fn repair_registers_new_list_channels() {
        let (platform, state, _dir) = list_setup(&["Mario"], LIST_MARKER).await;
        platform.add_channel(601, "compat-list-2", Some(LIST_MARKER));

        let guard = state.try_begin_mutation().unwrap();
        assert_eq!(repair(&state, &guard, 601).await.unwrap(), 1);
        assert!(state.channels().is_list_channel(601));
        assert_eq!(platform.contents(601).len(), 1);
    }

    #[tokio::test]
    async fn unreachable_channel_surfaces_platform_error() {
        let (platform, state, _dir) = list_setup(&["Mario"], LIST_MARKER).await;
        platform.fail_channel(LIST);

        let guard = state.try_begin_mutation().unwrap();
        let err = sync_all(&state, &guard).await.unwrap_err();
        assert!(matches!(err, ServiceError::Platform(_)));
    }
}
