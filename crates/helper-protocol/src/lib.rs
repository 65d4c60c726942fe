//! Helper Protocol Types
//!
//! Defines the newline-delimited JSON messages exchanged between the server
//! and the native helper injected into Messages.app.
//!
//! The helper connects to the server over TCP. The server writes one
//! [`HelperRequest`] per line; the helper writes back one [`HelperMessage`]
//! per line, either a transaction response or an unsolicited event.

pub mod actions;
pub mod error;
pub mod message;
pub mod request;

pub use error::ProtocolError;
pub use message::{HelperEvent, HelperMessage, TransactionResponse};
pub use request::HelperRequest;

/// Lowest TCP port the helper will connect to.
pub const MIN_PORT: u16 = 45670;

/// Highest TCP port the helper will connect to.
pub const MAX_PORT: u16 = 65535;

/// The uid that maps to [`MIN_PORT`] (first regular macOS user).
pub const BASE_UID: u32 = 501;

/// Port the helper connects to for a given user id.
///
/// Each macOS user gets its own port so several logged-in users can run a
/// server side by side: `MIN_PORT + uid - 501`, clamped to the valid range.
pub fn port_for_uid(uid: u32) -> u16 {
    let port = i64::from(MIN_PORT) + i64::from(uid) - i64::from(BASE_UID);
    port.clamp(i64::from(MIN_PORT), i64::from(MAX_PORT)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_for_first_user() {
        assert_eq!(port_for_uid(501), 45670);
        assert_eq!(port_for_uid(502), 45671);
    }

    #[test]
    fn test_port_clamped() {
        assert_eq!(port_for_uid(0), MIN_PORT);
        assert_eq!(port_for_uid(u32::MAX), MAX_PORT);
    }
}
