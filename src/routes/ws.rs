//! WebSocket endpoints for the two notification domains.
//!
//! `/ws/admin` requires a valid token before the upgrade completes; the
//! connection is then registered in the hub under the token subject.
//! `/ws/public` is open and mirrors only catalog events.

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header},
    response::Response,
    routing::get,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;

use crate::{
    dto::auth::Claims,
    error::AppError,
    hub::Event,
    middleware::auth::{jwt_secret, verify_token},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Browsers cannot set headers on WebSocket handshakes, so the token is
    /// also accepted as a query parameter.
    pub token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_ws))
        .route("/public", get(public_ws))
}

/// Token verification happens before the upgrade; a bad token is an HTTP 401
/// on the handshake, never an open-then-close socket.
pub async fn admin_ws(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let token = bearer_or_query(&headers, query.token).ok_or(AppError::Unauthorized)?;
    let secret = jwt_secret()?;
    let claims = verify_token(&token, &secret)?;

    Ok(ws.on_upgrade(move |socket| admin_session(socket, state, claims)))
}

pub async fn public_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| public_session(socket, state))
}

fn bearer_or_query(headers: &HeaderMap, query_token: Option<String>) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }
    query_token.filter(|t| !t.is_empty())
}

async fn admin_session(socket: WebSocket, state: AppState, claims: Claims) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = state.hub.register_admin(&claims.sub);
    tracing::info!(subject = %claims.sub, username = %claims.username, "admin listener connected");

    let hello = json!({
        "event": "connected",
        "data": {
            "message": "Connected to admin notifications",
            "adminId": claims.sub,
        },
    });
    if sink.send(Message::Text(hello.to_string().into())).await.is_err() {
        state.hub.unregister_admin(&claims.sub, &tx);
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    if forward(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if is_ping(text.as_str()) {
                        let pong = json!({
                            "event": "pong",
                            "data": { "timestamp": chrono::Utc::now().to_rfc3339() },
                        });
                        if sink.send(Message::Text(pong.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    state.hub.unregister_admin(&claims.sub, &tx);
    tracing::info!(subject = %claims.sub, "admin listener disconnected");
}

async fn public_session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.hub.subscribe_public();
    tracing::debug!("public listener connected");

    let hello = json!({
        "event": "connected",
        "data": { "message": "Connected to public notifications" },
    });
    if sink.send(Message::Text(hello.to_string().into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if forward(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                // A slow reader misses the skipped events and picks back up.
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "public listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    tracing::debug!("public listener disconnected");
}

async fn forward(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    event: &Event,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(text) => sink.send(Message::Text(text.into())).await,
        Err(err) => {
            tracing::warn!(error = %err, event = %event.event, "dropping unserializable event");
            Ok(())
        }
    }
}

fn is_ping(text: &str) -> bool {
    if text.trim() == "ping" {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .map(|v| v["event"] == "ping")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(
            bearer_or_query(&headers, Some("xyz".into())),
            Some("abc".into())
        );
    }

    #[test]
    fn falls_back_to_query_token() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_or_query(&headers, Some("xyz".into())), Some("xyz".into()));
        assert_eq!(bearer_or_query(&headers, Some(String::new())), None);
        assert_eq!(bearer_or_query(&headers, None), None);
    }

    #[test]
    fn ping_detection_accepts_both_forms() {
        assert!(is_ping("ping"));
        assert!(is_ping(r#"{"event":"ping"}"#));
        assert!(!is_ping(r#"{"event":"hello"}"#));
        assert!(!is_ping("pong"));
    }
}
