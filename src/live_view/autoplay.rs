//! AutoplayScheduler - timer-driven page rotation
//!
//! Owns a cancellable tokio task that advances the page (wrapping) after
//! every `autoplay_in_seconds` countdown. The task re-validates the
//! committed state under the write lock before each advance, so a tick
//! racing a disable either completes before the disabling mutation takes
//! the lock or never advances at all; `stop()` aborts the task outright.

use super::engine::EngineShared;
use super::pagination;
use super::types::autoplay_blocked;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub(super) struct AutoplayScheduler {
    shared: Arc<EngineShared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AutoplayScheduler {
    pub(super) fn new(shared: Arc<EngineShared>) -> Self {
        Self {
            shared,
            task: Mutex::new(None),
        }
    }

    /// Start the countdown loop, replacing any previous timer
    pub(super) async fn start(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }

        let shared = self.shared.clone();
        *task = Some(tokio::spawn(async move {
            loop {
                let seconds = shared.state.read().await.autoplay_in_seconds;
                tokio::time::sleep(Duration::from_secs(seconds)).await;

                let mut state = shared.state.write().await;
                if !state.autoplay {
                    break;
                }
                if let Some(reason) = autoplay_blocked(&state) {
                    shared.force_disable_autoplay(&mut state, reason).await;
                    break;
                }

                let page_count = state.page_count();
                state.page = pagination::advance_wrapping(state.page, page_count);
                tracing::debug!(page = state.page, page_count, "Autoplay advanced page");
                shared.broadcast_view(&state).await;
            }
        }));

        tracing::debug!("Autoplay timer started");
    }

    /// Cancel the timer, if one is running
    pub(super) async fn stop(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
            tracing::debug!("Autoplay timer stopped");
        }
    }

    /// Restart with a fresh countdown baseline
    pub(super) async fn restart(&self) {
        self.start().await;
    }
}
