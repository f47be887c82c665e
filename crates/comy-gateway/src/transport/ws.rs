//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Greet with ServerInfo, publish to the hub, then send the anonymous state
//! - Lifecycle: ping/pong + idle timeout + inbound frame size limit
//! - Decode once, then hand the message to the dispatcher

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use comy_core::error::Result;
use comy_core::protocol::CommandResponse;

use crate::app_state::AppState;
use crate::hub::Connection;
use crate::transport::codec::{decode, Inbound};

const OUTBOUND_QUEUE: usize = 1024;

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max = app.cfg().server.max_frame_bytes;
    ws.max_message_size(max).on_upgrade(move |socket| async move {
        let (tx, rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
        let conn = Connection::new(app.hub().next_id(), tx);
        let id = conn.id();
        let span = tracing::info_span!("session", conn = id);

        async {
            tracing::info!("session open");
            if let Err(e) = run_session(&app, conn, rx, socket).await {
                tracing::warn!(error = %e, "session ended with error");
            }
            app.hub().close(id);
            tracing::info!(live = app.hub().len(), "session closed");
        }
        .instrument(span)
        .await;
    })
}

async fn run_session(
    app: &AppState,
    conn: Connection,
    mut out_rx: mpsc::Receiver<Message>,
    socket: WebSocket,
) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // writer: drains the outbound queue so handlers never wait on the socket
    let mut writer = tokio::spawn(async move {
        while let Some(m) = out_rx.recv().await {
            if ws_tx.send(m).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // ServerInfo precedes any broadcast; state is read after publishing
    conn.send(&app.dispatcher().server_info().into()).await?;
    app.hub().insert(conn.clone());
    tracing::info!(live = app.hub().len(), "session published");
    conn.send(&app.dispatcher().state_for(None).into()).await?;

    let server = &app.cfg().server;
    let ping_every = Duration::from_millis(server.ping_interval_ms);
    let idle_timeout = Duration::from_millis(server.idle_timeout_ms);
    let max_frame = server.max_frame_bytes;

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // first tick fires immediately
    ping_tick.tick().await;

    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            _ = &mut writer => break,

            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match decode(msg, max_frame) {
                    Inbound::Client(m) => {
                        if let Err(e) = app.dispatcher().handle(&conn, m).await {
                            tracing::debug!(error = %e, "dispatch failed");
                            break;
                        }
                    }
                    Inbound::Malformed(e) => {
                        tracing::debug!(error = %e, code = e.client_code().as_str(), "malformed message");
                        conn.send(&CommandResponse::unexpected_error().into()).await?;
                    }
                    Inbound::TooLarge(len) => {
                        tracing::warn!(len, max_frame, "frame too large, closing");
                        break;
                    }
                    Inbound::Ping(payload) => {
                        let _ = conn.try_send_raw(Message::Pong(payload));
                    }
                    Inbound::Pong => {}
                    Inbound::Close => break,
                }
            }

            _ = ping_tick.tick() => {
                let _ = conn.try_send_raw(Message::Ping(Vec::new()));
            }

            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                tracing::info!(timeout = ?idle_timeout, "idle timeout");
                break;
            }
        }
    }

    writer.abort();
    Ok(())
}
