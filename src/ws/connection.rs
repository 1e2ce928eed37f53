//! WebSocket connection loop.
//!
//! Forwards the user's notifications from a [`NotificationListener`] and
//! answers the small set of [`WsCommand`]s.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::domain::UserId;
use crate::service::{NotificationListener, NotificationService};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Sends the current unread count first.
/// - Forwards every [`crate::service::ListenerEvent`] for the user.
/// - Replies to commands from the client.
pub async fn run_connection(
    socket: WebSocket,
    mut listener: NotificationListener,
    notifications: NotificationService,
    user_id: UserId,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let hello = WsMessage::event(serde_json::json!({
        "type": "connected",
        "unread": listener.unread(),
    }));
    if send(&mut ws_tx, &hello).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut listener, &notifications, user_id).await;
                        if send(&mut ws_tx, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
            event = listener.next() => {
                let Some(event) = event else { break };
                let payload = serde_json::to_value(&event).unwrap_or_default();
                if send(&mut ws_tx, &WsMessage::event(payload)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(%user_id, "ws connection closed");
}

async fn send<S>(tx: &mut S, msg: &WsMessage) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    tx.send(Message::text(json)).await.map_err(|_| ())
}

/// Handles a text message from the client, returning the reply.
async fn handle_text_message(
    text: &str,
    listener: &mut NotificationListener,
    notifications: &NotificationService,
    user_id: UserId,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command");
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    let result = match command {
        WsCommand::Ping => Ok(serde_json::json!({ "pong": true })),
        WsCommand::Unread => notifications
            .unread_count(user_id)
            .await
            .map(|unread| serde_json::json!({ "unread": unread })),
        WsCommand::MarkRead { id } => match notifications.mark_read(user_id, id).await {
            Ok(()) => notifications
                .unread_count(user_id)
                .await
                .map(|unread| serde_json::json!({ "read": id, "unread": unread })),
            Err(err) => Err(err),
        },
        WsCommand::MarkAllRead => notifications
            .mark_all_read(user_id)
            .await
            .map(|marked| serde_json::json!({ "marked": marked, "unread": 0 })),
    };

    match result {
        Ok(payload) => {
            if let Some(unread) = payload.get("unread").and_then(serde_json::Value::as_u64) {
                listener.set_unread(unread);
            }
            WsMessage::response(msg.id, payload)
        }
        Err(err) => {
            tracing::warn!(%user_id, error = %err, "ws command failed");
            WsMessage::error(msg.id, err.status_code().as_u16(), &err.to_string())
        }
    }
}
