//! Private API helper connection

mod mock;
mod rpc;
mod service;
mod transaction;

pub use mock::MockHelper;
pub use rpc::{HelperError, HelperRpc, TransactionResult};
pub use service::HelperService;
pub use transaction::TransactionManager;
