//! Recording app controller for tests

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::time::Instant;

use super::app_control::{AppControlError, AppController, LifecycleStep};

/// Records each step and when it ran; optionally fails one step.
#[derive(Default)]
pub struct RecordingController {
    calls: Mutex<Vec<(LifecycleStep, Instant)>>,
    fail_at: Option<LifecycleStep>,
}

impl RecordingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(step: LifecycleStep) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: Some(step),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(LifecycleStep, Instant)>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<(LifecycleStep, Instant)> {
        self.lock().clone()
    }

    pub fn steps(&self) -> Vec<LifecycleStep> {
        self.lock().iter().map(|(step, _)| *step).collect()
    }
}

#[async_trait]
impl AppController for RecordingController {
    async fn run_step(&self, step: LifecycleStep) -> Result<(), AppControlError> {
        self.lock().push((step, Instant::now()));
        if self.fail_at == Some(step) {
            return Err(AppControlError::ScriptFailed {
                step,
                code: Some(1),
                stderr: "execution error".to_string(),
            });
        }
        Ok(())
    }
}
