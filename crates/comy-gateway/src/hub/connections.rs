use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::DashMap;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use comy_core::error::{ComyError, Result};
use comy_core::protocol::ServerMessage;

use crate::hub::types::PreparedMsg;

/// One connection's outbound queue sender.
#[derive(Clone, Debug)]
pub struct Connection {
    id: u64,
    tx: mpsc::Sender<Message>,
}

impl Connection {
    pub fn new(id: u64, tx: mpsc::Sender<Message>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Serialize and enqueue, waiting for queue space.
    pub async fn send(&self, msg: &ServerMessage) -> Result<()> {
        let prepared = PreparedMsg::prepare(msg)?;
        self.send_prepared(&prepared).await
    }

    pub async fn send_prepared(&self, prepared: &PreparedMsg) -> Result<()> {
        self.tx
            .send(prepared.to_ws_message())
            .await
            .map_err(|_| ComyError::Internal("outbound channel closed".into()))
    }

    /// Enqueue a raw transport frame (ping/pong) without waiting.
    pub fn try_send_raw(&self, msg: Message) -> bool {
        self.tx.try_send(msg).is_ok()
    }
}

/// Registry of live connections: `id -> Connection`.
pub struct ConnectionHub {
    conns: DashMap<u64, Connection>,
    seq: AtomicU64,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate an id without publishing anything.
    pub fn next_id(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Publish `conn` to broadcasts from now on.
    pub fn insert(&self, conn: Connection) {
        self.conns.insert(conn.id(), conn);
    }

    /// Allocate and publish in one step.
    pub fn open(&self, tx: mpsc::Sender<Message>) -> Connection {
        let conn = Connection::new(self.next_id(), tx);
        self.insert(conn.clone());
        conn
    }

    pub fn close(&self, id: u64) -> Option<Connection> {
        self.conns.remove(&id).map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Serialize once, deliver to every live connection concurrently with a
    /// per-connection timeout. Returns how many connections accepted it.
    pub async fn broadcast(&self, msg: &ServerMessage, per_conn_timeout: Duration) -> Result<usize> {
        let prepared = PreparedMsg::prepare(msg)?;
        let targets: Vec<Connection> = self.conns.iter().map(|r| r.value().clone()).collect();

        let mut futs = FuturesUnordered::new();
        for conn in targets {
            let prepared = prepared.clone();
            futs.push(async move {
                matches!(
                    timeout(per_conn_timeout, conn.send_prepared(&prepared)).await,
                    Ok(Ok(()))
                )
            });
        }

        let mut delivered = 0;
        while let Some(ok) = futs.next().await {
            if ok {
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}
