//! Refresh orchestration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cache::FriendLocationCache;
use super::devices::DeviceCacheReader;
use super::location::LocationRecord;
use crate::apple::{run_refresh_sequence, AppController, RefreshTimings};
use crate::error::BridgeResult;
use crate::private_api::PrivateApi;

/// Clears the in-flight flag when the background run ends, even on panic.
struct FlightGuard(Arc<AtomicBool>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives friend and device refreshes.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    cache: Arc<FriendLocationCache>,
    devices: DeviceCacheReader,
    private_api: PrivateApi,
    controller: Arc<dyn AppController>,
    timings: RefreshTimings,
    single_flight: bool,
    in_flight: Arc<AtomicBool>,
}

impl RefreshOrchestrator {
    pub fn new(
        cache: Arc<FriendLocationCache>,
        devices: DeviceCacheReader,
        private_api: PrivateApi,
        controller: Arc<dyn AppController>,
    ) -> Self {
        Self {
            cache,
            devices,
            private_api,
            controller,
            timings: RefreshTimings::default(),
            single_flight: false,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timings(mut self, timings: RefreshTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Skip a background lifecycle run while another is still going.
    pub fn with_single_flight(mut self, single_flight: bool) -> Self {
        self.single_flight = single_flight;
        self
    }

    pub fn cache(&self) -> &Arc<FriendLocationCache> {
        &self.cache
    }

    pub fn device_reader(&self) -> &DeviceCacheReader {
        &self.devices
    }

    /// Current friend snapshot.
    pub fn get_friends(&self) -> Vec<LocationRecord> {
        self.cache.get_all()
    }

    /// Current device list from the snapshot files.
    pub async fn get_devices(&self) -> Option<Vec<Value>> {
        self.devices.get_devices().await
    }

    /// Pull friends from the helper, kick off the app lifecycle in the
    /// background, and return the cache snapshot.
    ///
    /// The lifecycle starts whether or not the helper step succeeded; a
    /// helper error is still returned.
    pub async fn refresh_friends(&self) -> BridgeResult<Vec<LocationRecord>> {
        let pulled = self.refresh_from_helper().await;
        self.spawn_lifecycle();
        pulled?;
        Ok(self.cache.get_all())
    }

    /// Like [`refresh_friends`](Self::refresh_friends) but leaves the app
    /// alone.
    pub async fn refresh_friends_without_app(&self) -> BridgeResult<Vec<LocationRecord>> {
        self.refresh_from_helper().await?;
        Ok(self.cache.get_all())
    }

    /// Cycle the app, wait for it, then re-read the snapshot files.
    pub async fn refresh_devices(&self) -> BridgeResult<Option<Vec<Value>>> {
        run_refresh_sequence(self.controller.as_ref(), &self.timings).await?;
        Ok(self.devices.get_devices().await)
    }

    async fn refresh_from_helper(&self) -> BridgeResult<()> {
        if !self.private_api.is_enabled() || !self.private_api.platform().is_min_big_sur() {
            debug!("Private API refresh skipped");
            return Ok(());
        }

        self.private_api.check_status()?;
        let locations = self.private_api.refresh_friends().await?;
        let updated = self.cache.add_all(locations);
        info!(updated = updated.len(), "Refreshed FindMy friends via Private API");
        Ok(())
    }

    /// Start the lifecycle sequence without waiting for it.
    ///
    /// Returns `None` when single-flight is on and a run is already going.
    pub fn spawn_lifecycle(&self) -> Option<JoinHandle<()>> {
        let guard = if self.single_flight {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                debug!("FindMy lifecycle already running; not starting another");
                return None;
            }
            Some(FlightGuard(Arc::clone(&self.in_flight)))
        } else {
            None
        };

        let controller = Arc::clone(&self.controller);
        let timings = self.timings;
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = run_refresh_sequence(controller.as_ref(), &timings).await {
                warn!(error = %e, "Failed to refresh FindMy app");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apple::{LifecycleStep, RecordingController};
    use crate::error::BridgeError;
    use crate::helper::{HelperError, MockHelper};
    use crate::platform::{MacOsVersion, Platform};
    use helper_protocol::actions::names;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        orchestrator: RefreshOrchestrator,
        helper: Arc<MockHelper>,
        controller: Arc<RecordingController>,
        _dir: TempDir,
    }

    fn fixture(enabled: bool, platform: Platform, helper: MockHelper) -> Fixture {
        let dir = TempDir::new().unwrap();
        let helper = Arc::new(helper);
        let controller = Arc::new(RecordingController::new());
        let orchestrator = RefreshOrchestrator::new(
            Arc::new(FriendLocationCache::new()),
            DeviceCacheReader::new(dir.path()),
            PrivateApi::new(helper.clone(), enabled, platform),
            controller.clone(),
        );
        Fixture {
            orchestrator,
            helper,
            controller,
            _dir: dir,
        }
    }

    fn sonoma() -> Platform {
        Platform::macos(MacOsVersion::new(14, 0, 0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_friends_without_app_feeds_cache() {
        let helper = MockHelper::new();
        helper.respond(
            names::REFRESH_FINDMY_FRIENDS,
            json!({"locations": [
                {"handle": "a@x.com", "coordinates": [1.0, 2.0], "last_updated": 5},
                {"coordinates": [3.0, 4.0]}
            ]}),
        );
        let f = fixture(true, sonoma(), helper);

        let friends = f.orchestrator.refresh_friends_without_app().await.unwrap();

        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].key(), Some("a@x.com"));
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        assert!(f.controller.steps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_private_api_skips_helper() {
        let f = fixture(false, sonoma(), MockHelper::disconnected());

        let friends = f.orchestrator.refresh_friends_without_app().await.unwrap();

        assert!(friends.is_empty());
        assert!(f.helper.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_macos_skips_helper() {
        let f = fixture(true, Platform::macos(MacOsVersion::new(10, 15, 0)), MockHelper::new());

        f.orchestrator.refresh_friends_without_app().await.unwrap();

        assert!(f.helper.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_helper_errors_propagate() {
        let f = fixture(true, sonoma(), MockHelper::disconnected());
        let err = f.orchestrator.refresh_friends().await.unwrap_err();
        assert!(matches!(err, BridgeError::Helper(HelperError::NotConnected)));

        let helper = MockHelper::new();
        helper.time_out(names::REFRESH_FINDMY_FRIENDS);
        let f = fixture(true, sonoma(), helper);
        let err = f.orchestrator.refresh_friends().await.unwrap_err();
        assert!(matches!(err, BridgeError::Helper(HelperError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_runs_when_helper_fails() {
        let f = fixture(true, sonoma(), MockHelper::disconnected());

        assert!(f.orchestrator.refresh_friends().await.is_err());
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;

        assert_eq!(
            f.controller.steps(),
            vec![
                LifecycleStep::Quit,
                LifecycleStep::Launch,
                LifecycleStep::Activate,
                LifecycleStep::Hide
            ]
        );

        let helper = MockHelper::new();
        helper.fail(names::REFRESH_FINDMY_FRIENDS, "boom");
        let f = fixture(true, sonoma(), helper);
        assert!(f.orchestrator.refresh_friends().await.is_err());
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        assert_eq!(f.controller.steps().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_friends_runs_lifecycle_in_background() {
        let f = fixture(false, sonoma(), MockHelper::new());

        f.orchestrator.refresh_friends().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;

        assert_eq!(
            f.controller.steps(),
            vec![
                LifecycleStep::Quit,
                LifecycleStep::Launch,
                LifecycleStep::Activate,
                LifecycleStep::Hide
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_coalesces() {
        let f = fixture(false, sonoma(), MockHelper::new());
        let orchestrator = f.orchestrator.clone().with_single_flight(true);

        let first = orchestrator.spawn_lifecycle();
        let second = orchestrator.spawn_lifecycle();
        assert!(first.is_some());
        assert!(second.is_none());

        first.unwrap().await.unwrap();
        assert_eq!(f.controller.steps().len(), 4);

        // flag cleared after the run
        let third = orchestrator.spawn_lifecycle();
        assert!(third.is_some());
        third.unwrap().await.unwrap();
        assert_eq!(f.controller.steps().len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_leaves_device_refresh_alone() {
        let f = fixture(false, sonoma(), MockHelper::new());
        let orchestrator = f.orchestrator.clone().with_single_flight(true);

        let background = orchestrator.spawn_lifecycle().unwrap();
        orchestrator.refresh_devices().await.unwrap();
        background.await.unwrap();

        assert_eq!(f.controller.steps().len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_runs_without_single_flight() {
        let f = fixture(false, sonoma(), MockHelper::new());

        let a = f.orchestrator.spawn_lifecycle().unwrap();
        let b = f.orchestrator.spawn_lifecycle().unwrap();
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(f.controller.steps().len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_devices_awaits_lifecycle() {
        let f = fixture(false, sonoma(), MockHelper::new());
        std::fs::write(f._dir.path().join("Devices.data"), r#"[{"id":"d1"}]"#).unwrap();

        let devices = f.orchestrator.refresh_devices().await.unwrap().unwrap();

        assert_eq!(devices, vec![json!({"id": "d1"})]);
        assert_eq!(f.controller.steps().len(), 4);
    }
}
