#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use comy_core::protocol::{CommandResponse, CommandResult, ServerMessage, ServerState};
use comy_gateway::app_state::AppState;
use comy_gateway::catalog::{Command, CommandInfos};
use comy_gateway::{commands, config, router};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CFG: &str = r#"
version: 1
server:
  name: "Session server"
  max_frame_bytes: 256
"#;

async fn start() -> (AppState, SocketAddr) {
    let cfg = config::load_from_str(CFG).unwrap();
    let state = AppState::new(cfg, commands::builtin().unwrap()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router::build_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (state, addr)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/v1/ws")).await.unwrap();
    ws
}

/// Next server envelope, skipping transport pings.
async fn next_msg(ws: &mut Client) -> ServerMessage {
    loop {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("no frame within 2s")
            .expect("stream ended")
            .unwrap();
        match frame {
            Message::Text(_) => return serde_json::from_str(frame.to_text().unwrap()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

async fn next_state(ws: &mut Client) -> ServerState {
    match next_msg(ws).await {
        ServerMessage::ServerState(s) => s,
        other => panic!("expected ServerState, got {other:?}"),
    }
}

async fn next_command(ws: &mut Client) -> CommandResponse {
    match next_msg(ws).await {
        ServerMessage::CommandResponse(r) => r,
        other => panic!("expected CommandResponse, got {other:?}"),
    }
}

async fn greeted(addr: SocketAddr) -> Client {
    let mut ws = connect(addr).await;
    match next_msg(&mut ws).await {
        ServerMessage::ServerInfo(info) => {
            assert_eq!(info.server_name, "Session server");
            assert!(!info.is_secured);
        }
        other => panic!("expected ServerInfo first, got {other:?}"),
    }
    let state = next_state(&mut ws).await;
    assert!(state.commands.iter().any(|c| c.name == "Dices simulator"));
    assert!(state.auth_error.is_none());
    ws
}

#[tokio::test]
async fn connect_greets_with_info_then_state() {
    let (state, addr) = start().await;
    let _ws = greeted(addr).await;
    assert_eq!(state.hub().len(), 1);
}

#[tokio::test]
async fn malformed_frames_get_unexpected_error_and_session_survives() {
    let (_state, addr) = start().await;
    let mut ws = greeted(addr).await;

    for bad in ["not json", r#"{"type":"Bogus"}"#, r#"{"commandName":"Dices simulator"}"#] {
        ws.send(Message::text(bad)).await.unwrap();
        let resp = next_command(&mut ws).await;
        assert_eq!(resp.command_name, "");
        assert!(!resp.result.status.success);
        assert_eq!(resp.result.status.message, "Unexpected error");
    }

    ws.send(Message::text(r#"{"type":"NeedState"}"#)).await.unwrap();
    let state = next_state(&mut ws).await;
    assert_eq!(state.name, "Session server");

    ws.send(Message::text(
        r#"{"type":"ExecuteCommand","commandName":"Dices simulator","params":{"Number of dices":2}}"#,
    ))
    .await
    .unwrap();
    let resp = next_command(&mut ws).await;
    assert_eq!(resp.command_name, "Dices simulator");
    assert_eq!(resp.result.status.message, "Parameter type error");
}

#[tokio::test]
async fn oversized_frame_closes_the_session() {
    let (state, addr) = start().await;
    let mut ws = greeted(addr).await;

    ws.send(Message::text("x".repeat(1000))).await.unwrap();

    loop {
        match timeout(Duration::from_secs(2), ws.next()).await.expect("session stayed open") {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("unexpected frame {other:?}"),
        }
    }

    // the hub drops the connection once the session task unwinds
    for _ in 0..50 {
        if state.hub().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(state.hub().is_empty());
}

#[tokio::test]
async fn catalog_replace_reaches_live_sessions() {
    let (state, addr) = start().await;
    let mut ws = greeted(addr).await;

    let only = Command::sync("Only", |_: CommandInfos| CommandResult::default())
        .build()
        .unwrap();
    let delivered = state.replace_commands(vec![only]).await.unwrap();
    assert_eq!(delivered, 1);

    let pushed = next_state(&mut ws).await;
    let names: Vec<&str> = pushed.commands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Only"]);
}
