use tracing::info;

use crate::{
    error::ServiceError,
    state::{SharedState, channels::ChannelRole},
};

/// Channel counts found by a discovery pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
    pub list_channels: usize,
    pub log_channels: usize,
}

/// Rebuild the channel registry from the topics of every visible text channel.
///
/// The registry is cleared first so a repeated discovery never duplicates channels.
pub async fn discover_channels(state: &SharedState) -> Result<Discovery, ServiceError> {
    let platform = state.platform();
    let registry = state.channels();
    registry.clear();

    let mut found = Discovery::default();
    for guild in platform.guilds().await? {
        for channel in platform.text_channels(guild).await? {
            let (name, guild_name) = (channel.name.clone(), channel.guild_name.clone());
            match registry.register(channel) {
                Some(ChannelRole::List) => {
                    info!(channel = %name, guild = %guild_name, "got list channel");
                    found.list_channels += 1;
                }
                Some(ChannelRole::Log) => {
                    info!(channel = %name, guild = %guild_name, "got log channel");
                    found.log_channels += 1;
                }
                None => {}
            }
        }
    }

    info!(
        lists = found.list_channels,
        logs = found.log_channels,
        "channel discovery finished"
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        platform::memory::MemoryPlatform,
        state::{
            channels::{LIST_MARKER, LOG_MARKER},
            test_support::state_with,
        },
    };

    #[tokio::test]
    async fn discovery_classifies_and_does_not_duplicate() {
        let platform = MemoryPlatform::new();
        platform.add_channel(1, "compat-list", Some(LIST_MARKER));
        platform.add_channel(2, "compat-log", Some(LOG_MARKER));
        platform.add_channel(3, "general", None);
        let both = format!("{LOG_MARKER} {LIST_MARKER}");
        platform.add_channel(4, "mirror", Some(both.as_str()));
        let (state, _dir) = state_with(&platform).await;

        let first = discover_channels(&state).await.unwrap();
        let second = discover_channels(&state).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first,
            Discovery {
                list_channels: 2,
                log_channels: 1
            }
        );
        assert_eq!(state.channels().list_channels().len(), 2);
        assert_eq!(state.channels().log_channels().len(), 1);
    }
}
