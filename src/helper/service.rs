//! Helper TCP service
//!
//! The helper process connects in to `127.0.0.1:<port>` and speaks
//! newline-delimited JSON. The most recent connection is the active one;
//! requests always go out on it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use helper_protocol::actions::events;
use helper_protocol::{HelperEvent, HelperMessage, HelperRequest};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::rpc::{HelperError, HelperRpc, TransactionResult};
use super::transaction::TransactionManager;
use crate::events::BridgeEvent;
use crate::findmy::{FriendLocationCache, LocationRecord};

struct ActiveConnection {
    id: u64,
    tx: mpsc::UnboundedSender<String>,
}

/// Host side of the helper connection.
pub struct HelperService {
    transactions: TransactionManager,
    active: Mutex<Option<ActiveConnection>>,
    next_connection_id: AtomicU64,
    cache: Arc<FriendLocationCache>,
    events: broadcast::Sender<BridgeEvent>,
    request_timeout: Duration,
}

impl HelperService {
    pub fn new(
        cache: Arc<FriendLocationCache>,
        events: broadcast::Sender<BridgeEvent>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transactions: TransactionManager::new(),
            active: Mutex::new(None),
            next_connection_id: AtomicU64::new(1),
            cache,
            events,
            request_timeout,
        }
    }

    /// Bind the loopback listener for `port`.
    pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
        TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await
    }

    /// Accept helper connections until the listener fails.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        info!(addr = %listener.local_addr()?, "Private API listener started");
        loop {
            let (stream, peer) = listener.accept().await?;
            let service = Arc::clone(&self);
            tokio::spawn(async move {
                service.handle_connection(stream, peer).await;
            });
        }
    }

    pub fn pending_transactions(&self) -> usize {
        self.transactions.pending_count()
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveConnection>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_sender(&self) -> Option<mpsc::UnboundedSender<String>> {
        self.active()
            .as_ref()
            .filter(|conn| !conn.tx.is_closed())
            .map(|conn| conn.tx.clone())
    }

    /// Clear the active slot if it still belongs to `id`.
    fn release(&self, id: u64) -> bool {
        let mut active = self.active();
        if active.as_ref().is_some_and(|conn| conn.id == id) {
            *active = None;
            true
        } else {
            false
        }
    }

    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let (reader, mut writer) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        if self.active().replace(ActiveConnection { id, tx }).is_some() {
            info!(peer = %peer, "Private API Helper reconnected; replacing previous connection");
        } else {
            info!(peer = %peer, "Private API Helper connected");
        }

        let writer_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    warn!(error = %e, "Failed to write to Private API Helper");
                    break;
                }
            }
            let _ = writer.shutdown().await;
        });

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => match std::str::from_utf8(&buf) {
                    Ok(line) => self.handle_line(line),
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "Skipping non UTF-8 line from Private API Helper")
                    }
                },
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Private API Helper connection error");
                    break;
                }
            }
        }

        writer_task.abort();
        if self.release(id) {
            let rejected = self.transactions.reject_all();
            info!(peer = %peer, rejected, "Private API Helper disconnected");
        } else {
            debug!(peer = %peer, "Superseded Private API Helper connection closed");
        }
    }

    /// Dispatch one inbound line.
    pub fn handle_line(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match HelperMessage::decode(line) {
            Ok(HelperMessage::Transaction(response)) => {
                self.transactions
                    .resolve(&response.transaction_id, response.error, response.data);
            }
            Ok(HelperMessage::Event(event)) => self.handle_event(event),
            Err(e) => warn!(error = %e, "Failed to decode Private API Helper message"),
        }
    }

    fn handle_event(&self, event: HelperEvent) {
        match event.event.as_str() {
            events::NEW_FINDMY_LOCATION => {
                let records = LocationRecord::list_from_value(&event.data);
                let updated = self.cache.add_all(records);
                if updated.is_empty() {
                    return;
                }
                debug!(count = updated.len(), "Friend locations updated from helper");
                // No subscribers is fine.
                let _ = self.events.send(BridgeEvent::FriendLocationsUpdated(updated));
            }
            events::PING => debug!(
                text = event.field_str("message").unwrap_or_default(),
                process = event.field_str("process").unwrap_or_default(),
                "Private API Helper ping"
            ),
            other => debug!(event = %other, "Ignoring Private API Helper event"),
        }
    }
}

#[async_trait]
impl HelperRpc for HelperService {
    fn is_connected(&self) -> bool {
        self.active_sender().is_some()
    }

    async fn send_request(&self, action: &str, data: Value) -> Result<TransactionResult, HelperError> {
        let sender = self.active_sender().ok_or(HelperError::NotConnected)?;
        let (id, rx) = self.transactions.begin(action);

        let line = match HelperRequest::transaction(action, data, id.clone()).to_line() {
            Ok(line) => line,
            Err(e) => {
                self.transactions.cancel(&id);
                return Err(e.into());
            }
        };
        if sender.send(line).is_err() {
            self.transactions.cancel(&id);
            return Err(HelperError::NotConnected);
        }
        debug!(action = %action, transaction_id = %id, "Sent Private API request");

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome.map(TransactionResult::new),
            Ok(Err(_)) => Err(HelperError::Disconnected),
            Err(_) => {
                self.transactions.cancel(&id);
                Err(HelperError::Timeout {
                    action: action.to_string(),
                    after_ms: self.request_timeout.as_millis() as u64,
                })
            }
        }
    }
}
