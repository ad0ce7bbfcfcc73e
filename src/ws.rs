use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::actor::HubHandle;
use crate::app_state::AppState;
use crate::signal::{ClientMessage, ServerMessage};

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "client connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let _ = tx.send(ServerMessage::Connected {
        conn_id: conn_id.clone(),
    });
    state.hub.attach(&conn_id, tx);

    // Drain the outbox into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode server frame");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let hub = state.hub.clone();
    let reader_conn_id = conn_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => handle_text(&hub, &reader_conn_id, &text).await,
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(conn_id = %reader_conn_id, error = %err, "websocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.detach(&conn_id);
    tracing::info!(conn_id = %conn_id, "client disconnected");
}

async fn handle_text(hub: &HubHandle, conn_id: &str, text: &str) {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::warn!(conn_id = %conn_id, error = %err, "ignoring malformed frame");
            return;
        }
    };

    match msg {
        ClientMessage::Join {
            display_name,
            room_id,
        } => {
            if let Err(err) = hub.join(conn_id, &display_name, &room_id).await {
                tracing::warn!(
                    conn_id = %conn_id,
                    room_id = %room_id,
                    error = %err,
                    "join rejected"
                );
            }
        }
        ClientMessage::Signal {
            message,
            to_conn_id,
        } => hub.relay(conn_id, &to_conn_id, message),
    }
}
