use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` while the record file is readable, `degraded` otherwise.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().read().await {
        Ok(_) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "record store unreadable");
            HealthResponse::degraded()
        }
    }
}
