//! Owner and housekeeping operations: store backup, DM cleanup, shutdown.

use tracing::{info, warn};

use crate::{
    error::ServiceError,
    platform::{Attachment, Snowflake},
    state::{MutationGuard, SharedState},
};

/// Upload the record file, as persisted, into `channel_id`.
pub async fn backup(
    state: &SharedState,
    _guard: &MutationGuard<'_>,
    channel_id: Snowflake,
) -> Result<(), ServiceError> {
    let store = state.store();
    let bytes = store.raw_contents().await?;
    let file_name = store
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "games.json".to_string());

    info!(file = %file_name, size = bytes.len(), "uploading record backup");
    state
        .platform()
        .upload(channel_id, Attachment { file_name, bytes })
        .await?;
    Ok(())
}

/// Delete every bot-authored message in the DM channel with `user_id`.
pub async fn clear_dm(state: &SharedState, user_id: Snowflake) -> Result<usize, ServiceError> {
    let platform = state.platform();
    let bot_id = state.bot_user().id;
    let channel_id = platform.dm_channel(user_id).await?;

    let mut removed = 0;
    for message in platform.history(channel_id).await? {
        if message.author_id == bot_id {
            platform.delete(channel_id, message.id).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Stop the process. The guard keeps other mutating commands out until exit.
pub fn shutdown(state: &SharedState, _guard: &MutationGuard<'_>) {
    warn!("goodbye, world");
    state.request_shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        platform::{
            ChatPlatform, direct_message,
            memory::{BOT_ID, MemoryPlatform},
        },
        state::test_support::{seed_records, state_with},
    };

    #[tokio::test]
    async fn backup_uploads_the_persisted_document() {
        let platform = MemoryPlatform::new();
        platform.add_channel(700, "bot-commands", None);
        let (state, _dir) = state_with(&platform).await;
        seed_records(&state, &["Mario"]).await;

        let guard = state.try_begin_mutation().unwrap();
        backup(&state, &guard, 700).await.unwrap();

        let uploads = platform.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1.file_name, "games.json");
        let records: Vec<crate::dao::models::Record> =
            serde_json::from_slice(&uploads[0].1.bytes).unwrap();
        assert_eq!(records[0].name, "Mario");
    }

    #[tokio::test]
    async fn clear_dm_only_removes_bot_messages() {
        let platform = MemoryPlatform::new();
        let (state, _dir) = state_with(&platform).await;
        direct_message(&platform, 42, "warning one".into()).await.unwrap();
        direct_message(&platform, 42, "warning two".into()).await.unwrap();
        let dm = platform.dm_channel(42).await.unwrap();
        platform.seed(dm, 42, "sorry!");

        assert_eq!(clear_dm(&state, 42).await.unwrap(), 2);
        assert_eq!(platform.dms_to(42), vec!["sorry!".to_string()]);
        assert!(platform.messages(dm).iter().all(|m| m.author_id != BOT_ID));
    }

    #[tokio::test]
    async fn shutdown_marks_state() {
        let platform = MemoryPlatform::new();
        let (state, _dir) = state_with(&platform).await;
        let guard = state.try_begin_mutation().unwrap();
        shutdown(&state, &guard);
        assert!(state.is_shutting_down());
    }
}
