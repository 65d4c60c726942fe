//! findmy-bridge
//!
//! Serves Find My friend and device locations, plus private Contacts
//! lookups, over a local HTTP API. Friend locations come from a helper
//! process over TCP; device locations come from the Find My app's
//! on-disk snapshot files.

pub mod apple;
pub mod config;
pub mod contacts;
pub mod error;
pub mod events;
pub mod findmy;
pub mod helper;
pub mod http;
pub mod platform;
pub mod private_api;
pub mod server;

pub use error::{BridgeError, BridgeResult};
pub use events::BridgeEvent;
pub use findmy::{FriendLocationCache, LocationRecord, RefreshOrchestrator};
pub use server::Bridge;
