//! Real-time channel. Every connected socket receives every published
//! event as a `{"event", "data"}` text frame. Nothing is sent back.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use sideline_events::BroadcastBus;

use crate::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let bus = state.bus.clone();
    ws.on_upgrade(move |socket| stream_events(socket, bus))
}

async fn stream_events(socket: WebSocket, bus: Arc<BroadcastBus>) {
    let mut handle = bus.subscribe();
    let subscriber = handle.id();
    info!(subscriber, "Real-time subscriber connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = handle.recv() => {
                let Some(event) = event else { break };
                let frame = event.to_frame().to_string();
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    debug!(subscriber, "Socket closed while sending");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    bus.unsubscribe(handle);
    info!(subscriber, "Real-time subscriber disconnected");
}
