//! Apple app automation

mod app_control;
mod mock;
pub mod scripts;

pub use app_control::{
    run_refresh_sequence, AppControlError, AppController, LifecycleStep, OsascriptController,
    RefreshTimings,
};
pub use mock::RecordingController;
