//! Server assembly

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::apple::{AppController, OsascriptController, RefreshTimings};
use crate::config::BridgeSettings;
use crate::contacts::ContactsApi;
use crate::error::BridgeResult;
use crate::events::{self, BridgeEvent};
use crate::findmy::{DeviceCacheReader, FriendLocationCache, RefreshOrchestrator};
use crate::helper::{HelperRpc, HelperService};
use crate::http::{self, AppState};
use crate::platform::Platform;
use crate::private_api::PrivateApi;

/// All long-lived components, wired together.
pub struct Bridge {
    pub settings: BridgeSettings,
    pub platform: Platform,
    pub cache: Arc<FriendLocationCache>,
    pub helper: Arc<HelperService>,
    pub events: broadcast::Sender<BridgeEvent>,
    pub state: AppState,
}

impl Bridge {
    pub fn new(settings: BridgeSettings, platform: Platform) -> Self {
        let controller: Arc<dyn AppController> =
            Arc::new(OsascriptController::new(settings.findmy_app_name.clone()));
        Self::with_controller(settings, platform, controller)
    }

    pub fn with_controller(
        settings: BridgeSettings,
        platform: Platform,
        controller: Arc<dyn AppController>,
    ) -> Self {
        let cache = Arc::new(FriendLocationCache::new());
        let (events, _) = events::channel();
        let helper = Arc::new(HelperService::new(
            Arc::clone(&cache),
            events.clone(),
            settings.request_timeout,
        ));

        let rpc: Arc<dyn HelperRpc> = helper.clone();
        let private_api = PrivateApi::new(rpc, settings.private_api_enabled, platform);
        let contacts = ContactsApi::new(private_api.clone(), settings.contacts_private_api_enabled);

        let timings = RefreshTimings {
            quit_wait: settings.quit_wait,
            launch_wait: settings.launch_wait,
            refresh_wait: settings.refresh_wait,
        };
        let findmy = RefreshOrchestrator::new(
            Arc::clone(&cache),
            DeviceCacheReader::new(&settings.findmy_cache_dir),
            private_api,
            controller,
        )
        .with_timings(timings)
        .with_single_flight(settings.single_flight);

        Self {
            settings,
            platform,
            cache,
            helper,
            events,
            state: AppState::new(findmy, contacts),
        }
    }

    /// Run the helper listener (when enabled) and the HTTP API until Ctrl-C.
    pub async fn run(self) -> BridgeResult<()> {
        info!(
            platform = %self.platform.describe(),
            cache_dir = %self.settings.findmy_cache_dir.display(),
            "Starting findmy-bridge"
        );

        let event_task = tokio::spawn(events::log_events(self.events.subscribe()));

        let helper_task = if self.settings.private_api_enabled {
            let listener = HelperService::bind(self.settings.private_api_port).await?;
            let helper = Arc::clone(&self.helper);
            Some(tokio::spawn(async move {
                if let Err(e) = helper.serve(listener).await {
                    warn!(error = %e, "Private API listener stopped");
                }
            }))
        } else {
            info!("Private API disabled; not listening for the helper");
            None
        };

        let listener = tokio::net::TcpListener::bind(self.settings.listen_addr).await?;
        http::serve(listener, self.state, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutting down");
        })
        .await?;

        if let Some(task) = helper_task {
            task.abort();
        }
        event_task.abort();
        Ok(())
    }
}
