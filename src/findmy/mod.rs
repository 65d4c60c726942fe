//! Find My locations and devices

mod cache;
mod devices;
mod location;
pub mod normalize;
mod refresh;
mod snapshot;
mod types;

pub use cache::{evaluate, Decision, FriendLocationCache, RejectReason};
pub use devices::DeviceCacheReader;
pub use location::{LocationRecord, LocationStatus};
pub use normalize::{item_to_device, item_to_device_value, model_display_name};
pub use refresh::RefreshOrchestrator;
pub use snapshot::{
    detect_format, is_binary_plist, parse_snapshot, SnapshotError, SnapshotFormat, SnapshotKind,
};
pub use types::{FindMyDevice, ItemGroup};
