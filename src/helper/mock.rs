//! Mock helper
//!
//! In-process stand-in for the helper with canned responses per action,
//! error injection and a request log.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::rpc::{HelperError, HelperRpc, TransactionResult};

enum Canned {
    Data(Value),
    Error(String),
    Timeout,
}

/// Configurable mock helper for testing
pub struct MockHelper {
    connected: AtomicBool,
    responses: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<(String, Value)>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHelper {
    /// A connected helper that answers every action with `null`.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        let mock = Self::new();
        mock.set_connected(false);
        mock
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Answer `action` with `data`.
    pub fn respond(&self, action: &str, data: Value) -> &Self {
        lock(&self.responses).insert(action.to_string(), Canned::Data(data));
        self
    }

    /// Fail `action` with a helper-reported error.
    pub fn fail(&self, action: &str, message: &str) -> &Self {
        lock(&self.responses).insert(action.to_string(), Canned::Error(message.to_string()));
        self
    }

    /// Make `action` time out.
    pub fn time_out(&self, action: &str) -> &Self {
        lock(&self.responses).insert(action.to_string(), Canned::Timeout);
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self, action: &str) -> usize {
        lock(&self.requests).iter().filter(|(a, _)| a == action).count()
    }
}

impl Default for MockHelper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HelperRpc for MockHelper {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_request(&self, action: &str, data: Value) -> Result<TransactionResult, HelperError> {
        if !self.is_connected() {
            return Err(HelperError::NotConnected);
        }
        lock(&self.requests).push((action.to_string(), data));

        match lock(&self.responses).get(action) {
            Some(Canned::Data(data)) => Ok(TransactionResult::new(data.clone())),
            Some(Canned::Error(message)) => Err(HelperError::Helper {
                action: action.to_string(),
                message: message.clone(),
            }),
            Some(Canned::Timeout) => Err(HelperError::Timeout {
                action: action.to_string(),
                after_ms: 0,
            }),
            None => Ok(TransactionResult::default()),
        }
    }
}
