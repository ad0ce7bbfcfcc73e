//! End-to-end signaling over real websockets.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use meshcall::accounts::InMemoryAccountStore;
use meshcall::app_state::AppState;
use meshcall::routes;
use meshcall::signal::{MemberNotice, ServerMessage};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (SocketAddr, AppState) {
    let state = AppState::new(InMemoryAccountStore::new());
    let app = routes::build_router(
        state.clone(),
        concat!(env!("CARGO_MANIFEST_DIR"), "/public"),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    (addr, state)
}

async fn next_frame(ws: &mut Client) -> ServerMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    let next = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

/// Connect and read the `connected` frame.
async fn connect(addr: SocketAddr) -> (Client, String) {
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    match next_frame(&mut ws).await {
        ServerMessage::Connected { conn_id } => (ws, conn_id),
        other => panic!("expected connected frame, got {other:?}"),
    }
}

async fn emit(ws: &mut Client, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn join(ws: &mut Client, name: &str, room: &str) {
    emit(
        ws,
        json!({"event": "userconnect", "data": {"displayName": name, "roomID": room}}),
    )
    .await;
}

async fn wait_for_members(state: &AppState, room: &str, count: usize) {
    for _ in 0..200 {
        if state.hub.members_of(room).await.len() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room {room} never reached {count} members");
}

fn notice(name: &str, conn_id: &str) -> MemberNotice {
    MemberNotice {
        other_user_id: name.to_string(),
        conn_id: conn_id.to_string(),
    }
}

#[tokio::test]
async fn join_relay_and_disconnect_over_websockets() {
    let (addr, state) = start_server().await;

    let (mut alice, alice_id) = connect(addr).await;
    join(&mut alice, "Alice", "R1").await;
    wait_for_members(&state, "R1", 1).await;
    assert_silent(&mut alice).await;

    let (mut bob, bob_id) = connect(addr).await;
    join(&mut bob, "Bob", "R1").await;
    assert_eq!(
        next_frame(&mut bob).await,
        ServerMessage::ExistingMember(notice("Alice", &alice_id))
    );
    assert_eq!(
        next_frame(&mut alice).await,
        ServerMessage::NewMember(notice("Bob", &bob_id))
    );

    let (mut carol, _) = connect(addr).await;
    join(&mut carol, "Carol", "R2").await;
    wait_for_members(&state, "R2", 1).await;
    assert_silent(&mut alice).await;
    assert_silent(&mut bob).await;
    assert_silent(&mut carol).await;

    let offer = json!("{\"offer\":{\"type\":\"offer\",\"sdp\":\"v=0\"}}");
    emit(
        &mut alice,
        json!({"event": "SDP_Process", "data": {"message": offer, "to_connId": bob_id}}),
    )
    .await;
    assert_eq!(
        next_frame(&mut bob).await,
        ServerMessage::Signal {
            message: offer,
            from_conn_id: alice_id.clone(),
        }
    );

    bob.close(None).await.unwrap();
    wait_for_members(&state, "R1", 1).await;

    emit(
        &mut alice,
        json!({"event": "SDP_Process", "data": {"message": "late", "to_connId": bob_id}}),
    )
    .await;
    assert_silent(&mut alice).await;

    let (mut dave, dave_id) = connect(addr).await;
    join(&mut dave, "Dave", "R1").await;
    assert_eq!(
        next_frame(&mut dave).await,
        ServerMessage::ExistingMember(notice("Alice", &alice_id))
    );
    assert_silent(&mut dave).await;
    assert_eq!(
        next_frame(&mut alice).await,
        ServerMessage::NewMember(notice("Dave", &dave_id))
    );
}

#[tokio::test]
async fn bad_frames_are_ignored_and_the_socket_stays_usable() {
    let (addr, state) = start_server().await;

    let (mut alice, alice_id) = connect(addr).await;
    join(&mut alice, "Alice", "R1").await;
    wait_for_members(&state, "R1", 1).await;

    let (mut eve, eve_id) = connect(addr).await;
    eve.send(Message::Text("not json".into())).await.unwrap();
    emit(&mut eve, json!({"event": "rename", "data": {"name": "x"}})).await;
    join(&mut eve, "", "R1").await;
    emit(&mut eve, json!({"event": "userconnect", "data": {"roomID": "R1"}})).await;

    assert_silent(&mut alice).await;
    assert_silent(&mut eve).await;
    assert_eq!(state.hub.members_of("R1").await.len(), 1);

    join(&mut eve, "Eve", "R1").await;
    assert_eq!(
        next_frame(&mut eve).await,
        ServerMessage::ExistingMember(notice("Alice", &alice_id))
    );
    assert!(matches!(
        next_frame(&mut alice).await,
        ServerMessage::NewMember(MemberNotice { conn_id, .. }) if conn_id == eve_id
    ));

    // A second join on the same socket changes nothing.
    join(&mut eve, "Eve", "R2").await;
    assert_silent(&mut eve).await;
    assert_silent(&mut alice).await;
    assert_eq!(state.hub.members_of("R1").await.len(), 2);
    assert!(state.hub.members_of("R2").await.is_empty());
}
