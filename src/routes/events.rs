use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use tracing::debug;
use validator::Validate;

use crate::{
    commands,
    dto::events::{EventAck, MessageEvent},
    error::AppError,
    state::SharedState,
};

const RELAY_TOKEN_HEADER: &str = "x-relay-token";

/// Inbound gateway events, guarded by the relay secret.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/events/message", post(message_created))
        .route_layer(middleware::from_fn_with_state(state, require_relay_token))
}

/// Accept a created message and hand it to the command layer in the background.
pub async fn message_created(
    State(state): State<SharedState>,
    Json(event): Json<MessageEvent>,
) -> Result<(StatusCode, Json<EventAck>), AppError> {
    event.validate()?;
    if state.is_shutting_down() {
        return Err(AppError::ServiceUnavailable("bot is shutting down".into()));
    }

    let accepted = !event.author.bot && event.content.starts_with(&state.config().command_prefix);
    if accepted {
        debug!(message = event.id, channel = event.channel_id, "dispatching command message");
        tokio::spawn(commands::handle_message(state.clone(), event));
    }
    Ok((StatusCode::ACCEPTED, Json(EventAck { accepted })))
}

async fn require_relay_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    check_relay_token(&state, req.headers())?;
    Ok(next.run(req).await)
}

fn check_relay_token(state: &SharedState, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(RELAY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing relay token header `X-Relay-Token`".into())
        })?;

    match state.config().relay_token.as_deref() {
        Some(token) if token == provided => Ok(()),
        Some(_) => Err(AppError::Unauthorized("invalid relay token".into())),
        None => Err(AppError::Unauthorized("no relay token configured".into())),
    }
}
