//! ConfigSync - remote live-view configuration mirror
//!
//! ## Responsibilities
//!
//! - One-time hydration read at startup
//! - Ordered, fire-and-forget write-through of local mutations
//!
//! Patches are enqueued from the engine and drained by a single writer
//! task, so issuance order is preserved on the wire even though callers
//! never wait. A failed push is logged and dropped: local state stays
//! authoritative for the session, durability across reloads is
//! best-effort.

mod types;

pub use types::{LiveViewConfig, LiveViewPatch, WireDevice};

use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// HTTP client for the CityOS configuration store
pub struct ConfigSyncClient {
    http: reqwest::Client,
    base_url: String,
}

impl ConfigSyncClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Read the persisted live-view configuration
    pub async fn read_live_view_config(&self) -> Result<LiveViewConfig> {
        let url = format!("{}/api/config/live-view", self.base_url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Config(format!(
                "live-view config read failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        Ok(response.json().await?)
    }

    /// Persist a partial update
    pub async fn save_live_view_config(&self, patch: &LiveViewPatch) -> Result<()> {
        let url = format!("{}/api/config/live-view", self.base_url);
        let response = self.http.patch(&url).json(patch).send().await?;

        if !response.status().is_success() {
            return Err(Error::Config(format!(
                "live-view config save failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }
}

/// Enqueue side of the write-through channel, held by the engine
#[derive(Clone)]
pub struct ConfigSyncHandle {
    tx: mpsc::UnboundedSender<LiveViewPatch>,
}

impl ConfigSyncHandle {
    /// Enqueue a patch for the writer task. Never blocks.
    pub fn push(&self, patch: LiveViewPatch) {
        if patch.is_empty() {
            return;
        }
        if self.tx.send(patch).is_err() {
            tracing::warn!("config sync writer is gone, dropping patch");
        }
    }
}

/// Create the write-through channel
pub fn channel() -> (ConfigSyncHandle, mpsc::UnboundedReceiver<LiveViewPatch>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ConfigSyncHandle { tx }, rx)
}

/// Spawn the single writer task draining patches in issuance order
pub fn spawn_writer(
    client: Arc<ConfigSyncClient>,
    mut rx: mpsc::UnboundedReceiver<LiveViewPatch>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(patch) = rx.recv().await {
            if let Err(e) = client.save_live_view_config(&patch).await {
                tracing::warn!(error = %e, "live-view config push failed");
            }
        }
        tracing::debug!("config sync writer stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_drops_empty_patches() {
        let (handle, mut rx) = channel();
        handle.push(LiveViewPatch::default());
        handle.push(LiveViewPatch::autoplay(true));
        let received = rx.recv().await.unwrap();
        assert_eq!(received, LiveViewPatch::autoplay(true));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn patches_arrive_in_issuance_order() {
        let (handle, mut rx) = channel();
        handle.push(LiveViewPatch::autoplay(true));
        handle.push(LiveViewPatch::autoplay_in_seconds(30));
        handle.push(LiveViewPatch::autoplay(false));

        assert_eq!(rx.recv().await.unwrap(), LiveViewPatch::autoplay(true));
        assert_eq!(
            rx.recv().await.unwrap(),
            LiveViewPatch::autoplay_in_seconds(30)
        );
        assert_eq!(rx.recv().await.unwrap(), LiveViewPatch::autoplay(false));
    }
}
