#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

use comy_core::param::Parameter;
use comy_core::protocol::{self, AuthenticationResponse, CommandResponse, CommandResult, ServerMessage, ServerState};
use comy_gateway::app_state::AppState;
use comy_gateway::catalog::{Command, CommandInfos};
use comy_gateway::commands;
use comy_gateway::config;
use comy_gateway::exec::{CancelProbe, Completion};
use comy_gateway::hub::Connection;

const SECURED: &str = r#"
version: 1
server:
  name: "Test server"
  command_timeout_ms: 3000
security:
  secured: true
  secret_key: "0123456789abcdef0123"
  groups:
    - name: "Admin"
    - name: "Member"
      parent: "Admin"
  users:
    - username: "root"
      password: "rootpw"
      group: "Admin"
    - username: "bob"
      password: "bobpw"
      group: "Member"
"#;

fn members_only() -> Command {
    Command::sync("Members", |_: CommandInfos| CommandResult::success("hi member"))
        .security_group("Member")
        .build()
        .unwrap()
}

fn hangs() -> Command {
    Command::asynchronous("Hang", |_: CommandInfos, _done: Completion, _: CancelProbe| async move {
        std::future::pending::<()>().await;
    })
    .build()
    .unwrap()
}

fn app(extra: Vec<Command>) -> AppState {
    let cfg = config::load_from_str(SECURED).unwrap();
    let mut cmds = commands::builtin().unwrap();
    cmds.extend(extra);
    AppState::new(cfg, cmds).unwrap()
}

fn connect(app: &AppState) -> (Connection, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(64);
    (app.hub().open(tx), rx)
}

async fn send(app: &AppState, conn: &Connection, json: &str) {
    let msg = protocol::decode(json).unwrap();
    app.dispatcher().handle(conn, msg).await.unwrap();
}

async fn recv(rx: &mut mpsc::Receiver<Message>) -> ServerMessage {
    match rx.recv().await {
        Some(Message::Text(s)) => serde_json::from_str(&s).unwrap(),
        other => panic!("unexpected frame {other:?}"),
    }
}

async fn recv_command(rx: &mut mpsc::Receiver<Message>) -> CommandResponse {
    match recv(rx).await {
        ServerMessage::CommandResponse(r) => r,
        other => panic!("expected CommandResponse, got {other:?}"),
    }
}

async fn recv_auth(rx: &mut mpsc::Receiver<Message>) -> AuthenticationResponse {
    match recv(rx).await {
        ServerMessage::Authentication(a) => a,
        other => panic!("expected Authentication, got {other:?}"),
    }
}

async fn recv_state(rx: &mut mpsc::Receiver<Message>) -> ServerState {
    match recv(rx).await {
        ServerMessage::ServerState(s) => s,
        other => panic!("expected ServerState, got {other:?}"),
    }
}

async fn login(app: &AppState, conn: &Connection, rx: &mut mpsc::Receiver<Message>, user: &str, pw: &str) -> AuthenticationResponse {
    send(
        app,
        conn,
        &format!(r#"{{"type":"AuthenticateCredentials","username":"{user}","password":"{pw}"}}"#),
    )
    .await;
    recv_auth(rx).await
}

#[tokio::test]
async fn dice_with_three_dices() {
    let app = app(vec![]);
    let (conn, mut rx) = connect(&app);

    send(
        &app,
        &conn,
        r#"{"type":"ExecuteCommand","commandName":"Dices simulator","params":{"Number of dices":"3"}}"#,
    )
    .await;

    let resp = recv_command(&mut rx).await;
    assert!(resp.result.status.success);
    let values: Vec<&str> = resp.result.message.trim_start_matches("Dices are ").split(' ').collect();
    assert_eq!(values.len(), 3);
}

#[tokio::test]
async fn unknown_command_is_not_found() {
    let app = app(vec![]);
    let (conn, mut rx) = connect(&app);

    send(&app, &conn, r#"{"type":"ExecuteCommand","commandName":"Foo"}"#).await;

    let resp = recv_command(&mut rx).await;
    let json = serde_json::to_value(ServerMessage::CommandResponse(resp)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "type": "CommandResponse",
            "commandName": "Foo",
            "result": {"message": "", "status": {"success": false, "message": "Command named \"Foo\" not found"}}
        })
    );
}

#[tokio::test]
async fn anonymous_call_to_member_command_is_unauthorized() {
    let app = app(vec![members_only()]);
    let (conn, mut rx) = connect(&app);

    send(&app, &conn, r#"{"type":"ExecuteCommand","commandName":"Members"}"#).await;

    let resp = recv_command(&mut rx).await;
    assert_eq!(resp.result.status.message, "Permissions missing");
    assert_eq!(resp.auth_error.unwrap().code, 401);

    let token = login(&app, &conn, &mut rx, "bob", "bobpw").await.token.unwrap();
    send(
        &app,
        &conn,
        &format!(r#"{{"type":"ExecuteCommand","commandName":"Members","token":"{token}"}}"#),
    )
    .await;
    let resp = recv_command(&mut rx).await;
    assert_eq!(resp.result, CommandResult::success("hi member"));
    assert!(resp.auth_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn hanging_async_command_times_out_once() {
    let app = app(vec![hangs()]);
    let (conn, mut rx) = connect(&app);

    let started = tokio::time::Instant::now();
    send(&app, &conn, r#"{"type":"ExecuteCommand","commandName":"Hang"}"#).await;

    let resp = recv_command(&mut rx).await;
    assert_eq!(resp.command_name, "Hang");
    assert_eq!(resp.result.status.message, "Command timed out");
    assert!(started.elapsed() >= Duration::from_millis(3000));

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn second_login_rotates_refresh_secret() {
    let app = app(vec![]);
    let (conn, mut rx) = connect(&app);

    let first = login(&app, &conn, &mut rx, "root", "rootpw").await;
    assert_eq!(first.code, 200);
    assert!(first.token.is_some());
    let first_refresh = first.refresh_token.unwrap();

    let second = login(&app, &conn, &mut rx, "root", "rootpw").await;
    assert_eq!(second.code, 200);
    let second_refresh = second.refresh_token.unwrap();

    send(
        &app,
        &conn,
        &format!(r#"{{"type":"RefreshToken","refreshToken":"{first_refresh}"}}"#),
    )
    .await;
    let rejected = recv_auth(&mut rx).await;
    assert_eq!(rejected.code, 401);
    assert_eq!(rejected.message, "Error with refresh token");

    send(
        &app,
        &conn,
        &format!(r#"{{"type":"RefreshToken","refreshToken":"{second_refresh}"}}"#),
    )
    .await;
    let refreshed = recv_auth(&mut rx).await;
    assert_eq!(refreshed.code, 200);
    assert!(refreshed.token.is_some());
}

#[tokio::test]
async fn wrong_credentials_and_token_checks() {
    let app = app(vec![]);
    let (conn, mut rx) = connect(&app);

    let bad = login(&app, &conn, &mut rx, "root", "nope").await;
    assert_eq!(bad.code, 401);
    assert!(bad.wrong_credentials_error);
    assert!(bad.token.is_none());

    send(&app, &conn, r#"{"type":"AuthenticateToken","token":"garbage"}"#).await;
    let rejected = recv_auth(&mut rx).await;
    assert_eq!(rejected.message, "Error with token");
    assert!(!rejected.token_expired_error);

    let ok = login(&app, &conn, &mut rx, "bob", "bobpw").await;
    let token = ok.token.unwrap();
    send(&app, &conn, &format!(r#"{{"type":"AuthenticateToken","token":"{token}"}}"#)).await;
    let accepted = recv_auth(&mut rx).await;
    assert_eq!(accepted.code, 200);
    assert_eq!(accepted.username.as_deref(), Some("bob"));
}

#[tokio::test]
async fn state_is_filtered_by_caller() {
    let app = app(vec![members_only()]);
    let (conn, mut rx) = connect(&app);

    send(&app, &conn, r#"{"type":"NeedState"}"#).await;
    let anon = recv_state(&mut rx).await;
    assert_eq!(anon.name, "Test server");
    assert!(!anon.commands.iter().any(|c| c.name == "Members"));
    assert!(anon.auth_error.is_none());

    let token = login(&app, &conn, &mut rx, "root", "rootpw").await.token.unwrap();
    send(&app, &conn, &format!(r#"{{"type":"NeedState","token":"{token}"}}"#)).await;
    let admin = recv_state(&mut rx).await;
    assert!(admin.commands.iter().any(|c| c.name == "Members"));
}

#[tokio::test]
async fn state_reports_unauthorized_when_nothing_is_visible() {
    let cfg = config::load_from_str(SECURED).unwrap();
    let app = AppState::new(cfg, vec![members_only()]).unwrap();
    let (conn, mut rx) = connect(&app);

    send(&app, &conn, r#"{"type":"NeedState","token":"not.a.token"}"#).await;
    let state = recv_state(&mut rx).await;
    assert!(state.commands.is_empty());
    let err = state.auth_error.unwrap();
    assert_eq!(err.code, 401);
    assert_eq!(err.message, "Unauthorized");
    assert_eq!(err.token.as_deref(), Some("not.a.token"));
}

#[tokio::test]
async fn replacing_the_catalog_broadcasts_state() {
    let app = app(vec![]);
    let (_a, mut rx_a) = connect(&app);
    let (b, mut rx_b) = connect(&app);
    app.hub().close(b.id());

    let sample = Command::sync("Sample", |_: CommandInfos| CommandResult::default())
        .main_parameter(Parameter::int("n", 0))
        .build()
        .unwrap();
    let delivered = app.replace_commands(vec![sample]).await.unwrap();
    assert_eq!(delivered, 1);

    let state = recv_state(&mut rx_a).await;
    let names: Vec<&str> = state.commands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Sample"]);
    assert!(rx_b.try_recv().is_err());

    let dup = Command::sync("Sample", |_: CommandInfos| CommandResult::default())
        .build()
        .unwrap();
    assert!(app.register_commands(vec![dup]).await.is_err());
    assert_eq!(app.registry().snapshot().len(), 1);
}
