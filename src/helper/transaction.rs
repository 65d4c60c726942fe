//! Pending helper transactions
//!
//! Each request gets a fresh id. The entry leaves the map exactly once:
//! resolved by a response, rejected on disconnect, or cancelled on timeout.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use super::rpc::HelperError;

type Outcome = Result<Value, HelperError>;

struct Pending {
    action: String,
    tx: oneshot::Sender<Outcome>,
}

/// Map of in-flight transactions.
#[derive(Default)]
pub struct TransactionManager {
    pending: Mutex<HashMap<String, Pending>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a transaction; returns its id and the receiver for its outcome.
    pub fn begin(&self, action: &str) -> (String, oneshot::Receiver<Outcome>) {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.lock().insert(
            id.clone(),
            Pending {
                action: action.to_string(),
                tx,
            },
        );
        (id, rx)
    }

    /// Settle a transaction from a helper response.
    ///
    /// Returns false for unknown ids (late, duplicate or never issued).
    pub fn resolve(&self, id: &str, error: Option<String>, data: Value) -> bool {
        let Some(pending) = self.lock().remove(id) else {
            debug!(transaction_id = %id, "Discarding response for unknown transaction");
            return false;
        };

        let outcome = match error {
            Some(message) => Err(HelperError::Helper {
                action: pending.action,
                message,
            }),
            None => Ok(data),
        };
        // Receiver dropped means the caller already gave up.
        let _ = pending.tx.send(outcome);
        true
    }

    /// Drop a transaction without settling it (caller timed out).
    pub fn cancel(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Reject every in-flight transaction; returns how many there were.
    pub fn reject_all(&self) -> usize {
        let drained: Vec<Pending> = self.lock().drain().map(|(_, p)| p).collect();
        let count = drained.len();
        for pending in drained {
            let _ = pending.tx.send(Err(HelperError::Disconnected));
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_once() {
        let manager = TransactionManager::new();
        let (id, rx) = manager.begin("refresh-findmy-friends");
        assert_eq!(manager.pending_count(), 1);

        assert!(manager.resolve(&id, None, json!({"locations": []})));
        assert!(!manager.resolve(&id, None, json!({"late": true})));
        assert_eq!(manager.pending_count(), 0);

        let data = rx.await.unwrap().unwrap();
        assert_eq!(data, json!({"locations": []}));
    }

    #[tokio::test]
    async fn test_helper_error() {
        let manager = TransactionManager::new();
        let (id, rx) = manager.begin("get-contact-photo");

        manager.resolve(&id, Some("No such handle".to_string()), Value::Null);

        match rx.await.unwrap() {
            Err(HelperError::Helper { action, message }) => {
                assert_eq!(action, "get-contact-photo");
                assert_eq!(message, "No such handle");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reject_all() {
        let manager = TransactionManager::new();
        let (_, rx1) = manager.begin("a");
        let (_, rx2) = manager.begin("b");

        assert_eq!(manager.reject_all(), 2);
        assert!(matches!(rx1.await.unwrap(), Err(HelperError::Disconnected)));
        assert!(matches!(rx2.await.unwrap(), Err(HelperError::Disconnected)));
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn test_cancel() {
        let manager = TransactionManager::new();
        let (id, _rx) = manager.begin("a");

        assert!(manager.cancel(&id));
        assert!(!manager.cancel(&id));
        assert!(!manager.resolve(&id, None, Value::Null));
    }

    #[test]
    fn test_ids_are_unique() {
        let manager = TransactionManager::new();
        let (a, _ra) = manager.begin("x");
        let (b, _rb) = manager.begin("x");
        assert_ne!(a, b);
    }
}
