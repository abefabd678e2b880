//! WebSocket stream: inbound position updates and outbound broadcasts.
use crate::api::update::handle_update_location;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
};
use geosync_core::{InboundFrame, ServerEvent, EVENT_UPDATE_LOCATION};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<WsQuery>,
) -> axum::response::Response {
    if state.config().require_stream_token {
        let provided = params.token.or_else(|| extract_bearer(&headers));
        let authorized = provided
            .as_deref()
            .map(|token| state.validator().validate(token).is_ok())
            .unwrap_or(false);
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    token: Option<String>,
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    let trimmed = token.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.hub().subscribe();
    tracing::debug!("Stream connected ({} subscriber(s))", state.hub().subscriber_count());

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) = dispatch_frame(&state, &text).await else {
                            continue;
                        };
                        let Ok(payload) = serde_json::to_string(&reply) else {
                            continue;
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(payload) => {
                        if socket.send(Message::Text(payload.as_ref().to_owned())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => {
                        // Drop missed updates; a newer snapshot will arrive soon.
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("Stream disconnected");
}

/// Route one client text frame. Returns the event to send back to that
/// client only, if any.
pub async fn dispatch_frame(state: &AppState, text: &str) -> Option<ServerEvent> {
    let frame = match InboundFrame::parse(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!("Ignoring malformed frame: {}", err);
            return None;
        }
    };

    if frame.event != EVENT_UPDATE_LOCATION {
        tracing::debug!("Ignoring unknown event {:?}", frame.event);
        return None;
    }

    let update = frame.location_update();
    match handle_update_location(state, update).await {
        Ok(_) => None,
        Err(err) => Some(ServerEvent::error(err.to_string())),
    }
}
