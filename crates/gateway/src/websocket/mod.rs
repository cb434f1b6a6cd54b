//! WebSocket endpoint: binds the caller's identity, registers a session
//! and shuttles events between the socket and the realtime hub.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use huddle_auth::Identity;
use huddle_realtime::{ClientEvent, RealtimeError, ServerEvent};
use serde::Deserialize;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct WebSocketQuery {
    token: Option<String>,
}

/// Upgrade handler. The credential is validated before the upgrade
/// completes; a refused bind never creates a session.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<WebSocketQuery>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let token = bearer_token(&headers)
        .or(query.token)
        .ok_or_else(|| GatewayError::AuthenticationFailed("missing token".to_string()))?;

    let identity = state.authenticator.bind_identity(&token).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, identity: Identity) {
    let (mut sink, mut stream) = socket.split();

    let user_public_id = identity.public_id.clone();
    let (session_id, mut outbound) = state.registry.register(identity).await;
    info!(session = %session_id, user = %user_public_id, "websocket connected");

    send_event(
        &mut sink,
        &ServerEvent::Hello {
            user_id: user_public_id.clone(),
        },
    )
    .await;

    let idle = Duration::from_secs(state.realtime.idle_timeout_seconds.max(1));
    let mut deadline = Instant::now() + idle;

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        deadline = Instant::now() + idle;
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => handle_client_event(&state, &session_id, event).await,
                            Err(err) => {
                                debug!(session = %session_id, %err, "unparseable client frame");
                                deliver(&state, &session_id, ServerEvent::Error {
                                    code: "bad_request".to_string(),
                                    message: "unrecognized event".to_string(),
                                }).await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        deadline = Instant::now() + idle;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(session = %session_id, %err, "websocket receive error");
                        break;
                    }
                }
            }
            event = outbound.recv() => {
                match event {
                    Some(event) => {
                        if !send_event(&mut sink, &event).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = sleep_until(deadline) => {
                info!(session = %session_id, "idle timeout, disconnecting");
                break;
            }
        }
    }

    // SessionNotFound here is a benign race with a forced eviction.
    let _ = state.registry.unregister(&session_id).await;
    info!(session = %session_id, "websocket disconnected");
}

async fn handle_client_event(state: &Arc<GatewayState>, session_id: &str, event: ClientEvent) {
    match event {
        ClientEvent::Ping => {
            deliver(state, session_id, ServerEvent::Pong).await;
        }
        ClientEvent::JoinTeam { team_id } => {
            match state.groups.join(session_id, &team_id).await {
                Ok(()) => deliver(state, session_id, ServerEvent::Joined { team_id }).await,
                Err(err) => deliver(state, session_id, error_event(err)).await,
            }
        }
        ClientEvent::LeaveTeam { team_id } => {
            match state.groups.leave(session_id, &team_id).await {
                Ok(()) => deliver(state, session_id, ServerEvent::Left { team_id }).await,
                Err(err) => deliver(state, session_id, error_event(err)).await,
            }
        }
        ClientEvent::SendMessage { team_id, content } => {
            // Delivery to the publisher rides the fanout like everyone
            // else's; only failures get a direct reply.
            if let Err(err) = state.fanout.publish(session_id, &team_id, &content).await {
                deliver(state, session_id, error_event(err)).await;
            }
        }
    }
}

async fn deliver(state: &Arc<GatewayState>, session_id: &str, event: ServerEvent) {
    if let Some(handle) = state.registry.session(session_id).await {
        handle.deliver(event);
    }
}

fn error_event(err: RealtimeError) -> ServerEvent {
    let code = match &err {
        RealtimeError::SessionNotFound => "session_not_found",
        RealtimeError::Denied { .. } => "denied",
        RealtimeError::Team(team_err) => match team_err {
            huddle_teams::TeamError::TeamNotFound { .. } => "not_found",
            huddle_teams::TeamError::Forbidden { .. } => "forbidden",
            _ => "internal",
        },
    };
    if code == "internal" {
        warn!(%err, "realtime request failed");
    }
    ServerEvent::Error {
        code: code.to_string(),
        message: err.to_string(),
    }
}

async fn send_event(
    sink: &mut (impl SinkExt<Message> + Unpin),
    event: &ServerEvent,
) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => sink.send(Message::Text(text)).await.is_ok(),
        Err(_) => false,
    }
}
