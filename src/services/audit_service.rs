use tracing::debug;

use crate::{error::ServiceError, state::SharedState};

/// Append `entry` to the audit trail of every registered log channel.
pub async fn record(state: &SharedState, entry: String) -> Result<(), ServiceError> {
    let channels = state.channels().log_channels();
    debug!(channels = channels.len(), "writing audit entry");
    for channel in channels {
        state.platform().send(channel.id, entry.clone()).await?;
    }
    Ok(())
}
