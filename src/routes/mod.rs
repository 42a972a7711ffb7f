use axum::Router;

use crate::state::SharedState;

pub mod events;
pub mod health;

/// Compose all route trees and wire in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(events::router(state.clone()))
        .with_state(state)
}
