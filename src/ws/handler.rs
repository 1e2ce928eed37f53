//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::SessionToken;
use crate::error::LeadSwipeError;

/// `?token=` query parameter; browsers cannot set headers on upgrades.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Session token.
    pub token: String,
}

/// `GET /ws?token=...`: Upgrade to a notification stream for the token's
/// user.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Unauthenticated`] for a bad token, before the
/// upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let caller = CurrentUser::resolve(&state, SessionToken::new(params.token)).await?;
    let user_id = caller.user.id;
    let listener = state.notifications.listen(user_id).await?;
    let notifications = state.notifications.clone();
    tracing::debug!(%user_id, "ws connection opened");

    Ok(ws.on_upgrade(move |socket| run_connection(socket, listener, notifications, user_id)))
}
