//! Friend location cache
//!
//! Keeps the single authoritative location per friend handle. Updates arrive
//! from refresh responses and from helper push events, possibly out of order
//! and from pathways of different fidelity; every update goes through
//! [`evaluate`] so that redelivery never regresses what is stored.
//!
//! ## Thread Safety
//!
//! One lock covers the whole map. `add` holds the write lock for the full
//! read-compare-replace, so concurrent updates for the same handle are
//! serialized. Records are swapped as whole values and readers clone them,
//! so a reader never sees a half-applied record.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use super::location::{LocationRecord, LocationStatus};

/// Outcome of comparing an incoming record against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No record for this handle yet.
    Insert,
    /// Replace the stored record in full.
    Replace,
    /// Keep the stored record.
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Decision::Reject(_))
    }
}

/// Why an update was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Handle missing or empty.
    MissingHandle,
    /// Legacy update against a non-legacy fix.
    LegacyDowngrade,
    /// Legacy `[0, 0]` update against a known legacy fix.
    LostFix,
    /// Same status, coordinates and timestamp.
    Duplicate,
    /// Older timestamp than the stored record.
    Stale,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingHandle => "missing handle",
            RejectReason::LegacyDowngrade => "legacy update over higher-fidelity fix",
            RejectReason::LostFix => "legacy update without a fix",
            RejectReason::Duplicate => "duplicate",
            RejectReason::Stale => "older than stored record",
        }
    }
}

/// Decide whether `incoming` should replace `current`.
///
/// Rules, in order:
/// 1. no handle: reject
/// 2. nothing stored: insert
/// 3. legacy over non-legacy: reject, whatever the timestamps
/// 4. reject if any of
///    a. both legacy, stored fix is non-zero, incoming is `[0, 0]`
///    b. identical status, coordinates and timestamp
///    c. incoming is strictly older
/// 5. otherwise replace
///
/// Missing coordinates and timestamps compare as `[0, 0]` and `0`.
pub fn evaluate(current: Option<&LocationRecord>, incoming: &LocationRecord) -> Decision {
    if incoming.key().is_none() {
        return Decision::Reject(RejectReason::MissingHandle);
    }

    let Some(current) = current else {
        return Decision::Insert;
    };

    if incoming.is_legacy() && !current.is_legacy() {
        return Decision::Reject(RejectReason::LegacyDowngrade);
    }

    let both_legacy = current.status == Some(LocationStatus::Legacy) && incoming.is_legacy();
    let current_coords = current.coords_or_zero();
    let incoming_coords = incoming.coords_or_zero();

    if both_legacy
        && current_coords[0] != 0.0
        && current_coords[1] != 0.0
        && incoming.has_zero_coordinates()
    {
        return Decision::Reject(RejectReason::LostFix);
    }

    if current.status == incoming.status
        && current_coords[0] == incoming_coords[0]
        && current_coords[1] == incoming_coords[1]
        && current.last_updated_or_zero() == incoming.last_updated_or_zero()
    {
        return Decision::Reject(RejectReason::Duplicate);
    }

    if incoming.last_updated_or_zero() < current.last_updated_or_zero() {
        return Decision::Reject(RejectReason::Stale);
    }

    Decision::Replace
}

#[derive(Debug, Default)]
struct Entries {
    /// Records in first-insertion order.
    records: Vec<LocationRecord>,
    /// Handle -> index into `records`.
    index: HashMap<String, usize>,
}

/// In-memory friend location cache.
///
/// Lives for the lifetime of the process. Records are never removed, only
/// inserted or replaced.
#[derive(Debug, Default)]
pub struct FriendLocationCache {
    entries: RwLock<Entries>,
}

impl FriendLocationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offer a record to the cache.
    ///
    /// Returns `true` if the cache changed (insert or full overwrite) and
    /// `false` if the record was rejected.
    pub fn add(&self, record: LocationRecord) -> bool {
        let mut entries = self.write();
        Self::add_locked(&mut entries, record).is_some()
    }

    /// Offer several records in order.
    ///
    /// Returns the records that changed the cache, in input order. This is
    /// the delta to broadcast to listeners.
    pub fn add_all<I>(&self, records: I) -> Vec<LocationRecord>
    where
        I: IntoIterator<Item = LocationRecord>,
    {
        let mut entries = self.write();
        records
            .into_iter()
            .filter_map(|record| Self::add_locked(&mut entries, record))
            .collect()
    }

    /// Apply one record under an already-held write lock, returning a copy of
    /// it when accepted.
    fn add_locked(entries: &mut Entries, record: LocationRecord) -> Option<LocationRecord> {
        let Some(handle) = record.key().map(str::to_owned) else {
            trace!("rejecting location without handle");
            return None;
        };

        let slot = entries.index.get(&handle).copied();
        let current = slot.map(|i| &entries.records[i]);

        match evaluate(current, &record) {
            Decision::Insert => {
                trace!(handle = %handle, "caching new friend location");
                entries.index.insert(handle, entries.records.len());
                entries.records.push(record.clone());
                Some(record)
            }
            Decision::Replace => {
                trace!(handle = %handle, "replacing friend location");
                let i = slot?;
                entries.records[i] = record.clone();
                Some(record)
            }
            Decision::Reject(reason) => {
                debug!(handle = %handle, reason = reason.as_str(), "ignoring friend location update");
                None
            }
        }
    }

    /// Look up one handle.
    pub fn get(&self, handle: &str) -> Option<LocationRecord> {
        let entries = self.read();
        entries
            .index
            .get(handle)
            .map(|&i| entries.records[i].clone())
    }

    /// Snapshot of every cached record, in first-insertion order.
    pub fn get_all(&self) -> Vec<LocationRecord> {
        self.read().records.clone()
    }

    /// Number of cached handles.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
