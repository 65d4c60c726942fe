use crate::contacts::ContactsApi;
use crate::findmy::RefreshOrchestrator;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub findmy: RefreshOrchestrator,
    pub contacts: ContactsApi,
}

impl AppState {
    pub fn new(findmy: RefreshOrchestrator, contacts: ContactsApi) -> Self {
        Self { findmy, contacts }
    }
}
