use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;

use patrol_channels::MessageRouter;

mod bootstrap;
mod scheduler;

use bootstrap::PatrolApp;

#[derive(Debug, Parser)]
#[command(name = "patrol-server")]
struct Args {
    #[arg(long, default_value = "config/patrol.yaml")]
    config: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[derive(Clone)]
struct AppState {
    router: Arc<MessageRouter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let app = PatrolApp::from_config_path(&args.config)
        .await
        .context("bootstrap failed")?;
    let _scheduler = scheduler::spawn_daily(app.engine.clone(), app.daily_at);

    let state = AppState {
        router: app.router.clone(),
    };
    let web = Router::new()
        .route("/health", get(health))
        .route("/callback", post(callback))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .context("bind server listener failed")?;
    tracing::info!(listen = %args.listen, "patrol-server listening");
    axum::serve(listener, web)
        .await
        .context("server terminated with error")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status":"ok"}))
}

/// LINE-style webhook envelope. Only text messages and follows are
/// interpreted; everything else is acknowledged and dropped.
#[derive(Debug, Deserialize)]
struct WebhookBody {
    #[serde(default)]
    events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WebhookEvent {
    Message {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: EventSource,
        message: MessagePayload,
    },
    Follow {
        source: EventSource,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct EventSource {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// The upstream retries on non-2xx, so per-event failures are logged and
/// the batch is always acknowledged.
async fn callback(State(state): State<AppState>, Json(body): Json<WebhookBody>) -> &'static str {
    for event in body.events {
        if let Err(err) = handle_event(&state, event).await {
            tracing::warn!(error = %err, "webhook event failed");
        }
    }
    "OK"
}

async fn handle_event(
    state: &AppState,
    event: WebhookEvent,
) -> Result<(), patrol_channels::ChannelError> {
    match event {
        WebhookEvent::Message {
            reply_token,
            source,
            message,
        } => {
            if message.kind != "text" {
                return Ok(());
            }
            let (Some(user_id), Some(text)) = (source.user_id, message.text) else {
                return Ok(());
            };
            state.router.handle_message(&user_id, &reply_token, &text).await
        }
        WebhookEvent::Follow { source } => match source.user_id {
            Some(user_id) => state.router.handle_follow(&user_id).await,
            None => Ok(()),
        },
        WebhookEvent::Other => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_envelope_parses() {
        let body: WebhookBody = serde_json::from_str(
            r#"{
                "destination": "xxx",
                "events": [
                    {
                        "type": "message",
                        "replyToken": "rt-1",
                        "source": {"type": "user", "userId": "U1"},
                        "message": {"id": "1", "type": "text", "text": "註冊"}
                    },
                    {
                        "type": "follow",
                        "source": {"type": "user", "userId": "U2"}
                    },
                    {
                        "type": "unfollow",
                        "source": {"type": "user", "userId": "U3"}
                    }
                ]
            }"#,
        )
        .expect("parse");

        assert_eq!(body.events.len(), 3);
        assert!(matches!(
            &body.events[0],
            WebhookEvent::Message { reply_token, message, .. }
                if reply_token == "rt-1" && message.text.as_deref() == Some("註冊")
        ));
        assert!(matches!(&body.events[1], WebhookEvent::Follow { source }
            if source.user_id.as_deref() == Some("U2")));
        assert!(matches!(&body.events[2], WebhookEvent::Other));
    }

    #[test]
    fn test_webhook_body_tolerates_missing_events() {
        let body: WebhookBody = serde_json::from_str(r#"{"destination": "xxx"}"#).expect("parse");
        assert!(body.events.is_empty());
    }
}
