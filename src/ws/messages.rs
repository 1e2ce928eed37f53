//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// A server event with a fresh id.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), WsMessageType::Event, payload)
    }

    /// A response to the command with `id`.
    #[must_use]
    pub fn response(id: String, payload: serde_json::Value) -> Self {
        Self::new(id, WsMessageType::Response, payload)
    }

    /// An error reply with an HTTP-like `code`.
    #[must_use]
    pub fn error(id: String, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }

    fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client notification event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands a client can send in the payload of a `command` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Liveness check.
    Ping,
    /// Re-read the unread count from the store.
    Unread,
    /// Mark one notification read.
    MarkRead {
        /// Notification id.
        id: i64,
    },
    /// Mark every notification read.
    MarkAllRead,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_payload() {
        let cmd: Result<WsCommand, _> =
            serde_json::from_value(serde_json::json!({ "command": "mark_read", "id": 7 }));
        assert_eq!(cmd.ok(), Some(WsCommand::MarkRead { id: 7 }));

        let cmd: Result<WsCommand, _> =
            serde_json::from_value(serde_json::json!({ "command": "subscribe" }));
        assert!(cmd.is_err());
    }

    #[test]
    fn error_payload_shape() {
        let msg = WsMessage::error("abc".to_string(), 400, "malformed JSON");
        assert_eq!(msg.msg_type, WsMessageType::Error);
        assert_eq!(msg.payload.get("code"), Some(&serde_json::json!(400)));
        assert_eq!(
            msg.payload.get("message").and_then(|m| m.as_str()),
            Some("malformed JSON")
        );
    }
}
