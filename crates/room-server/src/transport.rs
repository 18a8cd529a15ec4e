//! WebSocket transport.
//!
//! `GET /ws` upgrades to a WebSocket and hands it to a [`ConnectionActor`].
//! Text messages carry control frames and binary messages carry audio and
//! keepalive bytes. WebSocket-level ping/pong is answered by the library and
//! never reaches the actor.

use crate::actors::{ConnectionActor, RoomControllerHandle};
use crate::liveness::KeepaliveSettings;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use room_protocol::{Transport, TransportError, WireFrame};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// A [`Transport`] over an upgraded axum WebSocket.
pub struct WebSocketTransport {
    socket: WebSocket,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for WebSocketTransport {
    async fn recv(&mut self) -> Option<Result<WireFrame, TransportError>> {
        loop {
            let message = match self.socket.recv().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            };
            match message {
                Message::Text(text) => return Some(Ok(WireFrame::Text(text))),
                Message::Binary(data) => return Some(Ok(WireFrame::Binary(Bytes::from(data)))),
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => return None,
            }
        }
    }

    async fn send(&mut self, frame: WireFrame) -> Result<(), TransportError> {
        let message = match frame {
            WireFrame::Text(text) => Message::Text(text),
            WireFrame::Binary(data) => Message::Binary(data.to_vec()),
        };
        self.socket
            .send(message)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.socket.send(Message::Close(None)).await;
    }
}

#[derive(Debug)]
struct WsState {
    controller: RoomControllerHandle,
    keepalive: KeepaliveSettings,
}

/// Router serving `GET /ws`.
pub fn ws_router(controller: RoomControllerHandle, keepalive: KeepaliveSettings) -> Router {
    let state = Arc::new(WsState {
        controller,
        keepalive,
    });

    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let transport = WebSocketTransport::new(socket);
        ConnectionActor::new(transport, state.controller.clone(), state.keepalive)
            .run()
            .await;
    })
}
