//! Live notification stream over a real socket.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_test::assert_ok;
use tokio_tungstenite::tungstenite::Message;

use leadswipe::api::build_app;
use leadswipe::app_state::AppState;
use leadswipe::config::LeadSwipeConfig;
use leadswipe::domain::{Lead, LeadId};
use leadswipe::session::SwipeThresholds;
use leadswipe::store::{InMemoryStore, Store};

async fn serve() -> std::net::SocketAddr {
    let store = Arc::new(InMemoryStore::new());
    let mut lead = Lead::new(LeadId::new(1), "Grace Hopper");
    lead.first_name = Some("Grace".to_string());
    lead.last_name = Some("Hopper".to_string());
    store.insert_lead(lead).await;
    store.register_user("ana@example.com", "secret").await;

    let config = LeadSwipeConfig {
        swipe: SwipeThresholds {
            commit_delay: Duration::ZERO,
            ..SwipeThresholds::default()
        },
        ..LeadSwipeConfig::default()
    };
    let app = build_app(AppState::new(Store::from_adapter(store), &config), config.request_timeout);

    let listener = assert_ok!(tokio::net::TcpListener::bind("127.0.0.1:0").await);
    let addr = assert_ok!(listener.local_addr());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn next_json<S>(stream: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let next = tokio::time::timeout(Duration::from_secs(5), stream.next()).await;
    let Ok(Some(Ok(message))) = next else {
        panic!("expected a websocket message");
    };
    let text = assert_ok!(message.to_text());
    assert_ok!(serde_json::from_str(text))
}

fn payload<'a>(msg: &'a Value, key: &str) -> Option<&'a Value> {
    msg.get("payload").and_then(|p| p.get(key))
}

#[tokio::test]
async fn match_is_pushed_to_the_socket() {
    let addr = serve().await;
    let http = reqwest::Client::new();

    let response = assert_ok!(
        http.post(format!("http://{addr}/auth/sign-in"))
            .json(&json!({ "email": "ana@example.com", "password": "secret" }))
            .send()
            .await
    );
    let body: Value = assert_ok!(response.json().await);
    let Some(token) = body.get("token").and_then(Value::as_str).map(str::to_string) else {
        panic!("expected a token");
    };

    let (mut socket, _) =
        assert_ok!(tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token={token}")).await);
    let hello = next_json(&mut socket).await;
    assert_eq!(payload(&hello, "type"), Some(&json!("connected")));
    assert_eq!(payload(&hello, "unread"), Some(&json!(0)));

    let response = assert_ok!(
        http.post(format!("http://{addr}/api/v1/feed/swipe"))
            .bearer_auth(&token)
            .json(&json!({ "decision": "like" }))
            .send()
            .await
    );
    assert!(response.status().is_success());

    let event = next_json(&mut socket).await;
    assert_eq!(payload(&event, "type"), Some(&json!("notification")));
    assert_eq!(payload(&event, "unread"), Some(&json!(1)));
    let message_mentions_lead = payload(&event, "notification")
        .and_then(|n| n.get("message"))
        .and_then(Value::as_str)
        .is_some_and(|m| m.contains("Grace Hopper"));
    assert!(message_mentions_lead);

    let command = json!({
        "id": "1",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": { "command": "mark_all_read" }
    });
    assert_ok!(socket.send(Message::text(command.to_string())).await);
    let reply = next_json(&mut socket).await;
    assert_eq!(reply.get("type"), Some(&json!("response")));
    assert_eq!(payload(&reply, "unread"), Some(&json!(0)));
}

#[tokio::test]
async fn bad_token_is_refused_before_upgrade() {
    let addr = serve().await;
    let result = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token=nope")).await;
    assert!(result.is_err());
}
