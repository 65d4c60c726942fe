//! Find My app lifecycle
//!
//! Cycling the app (quit, relaunch, foreground, hide) makes it refresh its
//! snapshot files and push fresh friend locations.

use std::fmt;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::scripts;

/// One step of the lifecycle sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    Quit,
    Launch,
    Activate,
    Hide,
}

impl LifecycleStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStep::Quit => "quit",
            LifecycleStep::Launch => "launch",
            LifecycleStep::Activate => "activate",
            LifecycleStep::Hide => "hide",
        }
    }
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// App control errors
#[derive(Debug, thiserror::Error)]
pub enum AppControlError {
    #[error("Failed to run osascript for {step}: {source}")]
    Spawn {
        step: LifecycleStep,
        #[source]
        source: io::Error,
    },

    #[error("AppleScript for {step} failed (exit {code:?}): {stderr}")]
    ScriptFailed {
        step: LifecycleStep,
        code: Option<i32>,
        stderr: String,
    },
}

/// Something that can perform lifecycle steps on the Find My app.
#[async_trait]
pub trait AppController: Send + Sync {
    async fn run_step(&self, step: LifecycleStep) -> Result<(), AppControlError>;
}

/// Runs each step as an AppleScript through `osascript -e`.
#[derive(Debug, Clone)]
pub struct OsascriptController {
    app_name: String,
}

impl OsascriptController {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn script_for(&self, step: LifecycleStep) -> String {
        match step {
            LifecycleStep::Quit => scripts::quit_app(&self.app_name),
            LifecycleStep::Launch => scripts::start_app(&self.app_name),
            LifecycleStep::Activate => scripts::show_app(&self.app_name),
            LifecycleStep::Hide => scripts::hide_app(&self.app_name),
        }
    }
}

#[async_trait]
impl AppController for OsascriptController {
    async fn run_step(&self, step: LifecycleStep) -> Result<(), AppControlError> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(self.script_for(step))
            .output()
            .await
            .map_err(|source| AppControlError::Spawn { step, source })?;

        if !output.status.success() {
            return Err(AppControlError::ScriptFailed {
                step,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Waits between lifecycle steps.
///
/// The defaults are what the Find My app needs in practice; shorter values
/// exist for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTimings {
    /// After quitting, before relaunching.
    pub quit_wait: Duration,
    /// After launching, before bringing to the foreground.
    pub launch_wait: Duration,
    /// Time in the foreground before hiding.
    pub refresh_wait: Duration,
}

impl Default for RefreshTimings {
    fn default() -> Self {
        Self {
            quit_wait: Duration::from_secs(3),
            launch_wait: Duration::from_secs(5),
            refresh_wait: Duration::from_secs(15),
        }
    }
}

impl RefreshTimings {
    /// No waits at all.
    pub fn immediate() -> Self {
        Self {
            quit_wait: Duration::ZERO,
            launch_wait: Duration::ZERO,
            refresh_wait: Duration::ZERO,
        }
    }

    pub fn total(&self) -> Duration {
        self.quit_wait + self.launch_wait + self.refresh_wait
    }
}

/// Quit, wait, launch, wait, activate, wait, hide.
///
/// Stops at the first failing step.
pub async fn run_refresh_sequence(
    controller: &dyn AppController,
    timings: &RefreshTimings,
) -> Result<(), AppControlError> {
    info!("Cycling FindMy app to refresh locations");

    let plan = [
        (LifecycleStep::Quit, timings.quit_wait),
        (LifecycleStep::Launch, timings.launch_wait),
        (LifecycleStep::Activate, timings.refresh_wait),
        (LifecycleStep::Hide, Duration::ZERO),
    ];

    for (step, wait) in plan {
        debug!(step = %step, "Running FindMy lifecycle step");
        controller.run_step(step).await?;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    debug!("FindMy lifecycle sequence complete");
    Ok(())
}
