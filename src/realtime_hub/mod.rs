//! RealtimeHub - WebSocket distribution
//!
//! ## Responsibilities
//!
//! - WebSocket connection management
//! - Broadcasting fresh live-view snapshots after every state change
//!   (including autoplay ticks)
//! - Surfacing autoplay warnings to the wall UI

use crate::live_view::{AutoplayStopReason, LiveViewSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Hub message types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum HubMessage {
    /// Fresh snapshot after any live-view state change
    LiveViewUpdate(LiveViewSnapshot),
    /// The engine turned a running autoplay off
    AutoplayDisabled(AutoplayDisabledMessage),
}

/// Warning payload for an engine-initiated autoplay stop
#[derive(Debug, Clone, Serialize)]
pub struct AutoplayDisabledMessage {
    pub reason: AutoplayStopReason,
    pub message: String,
    pub timestamp: String,
}

impl AutoplayDisabledMessage {
    pub fn new(reason: AutoplayStopReason) -> Self {
        Self {
            reason,
            message: reason.message().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Client connection
struct ClientConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// RealtimeHub instance
pub struct RealtimeHub {
    connections: RwLock<HashMap<Uuid, ClientConnection>>,
    connection_count: AtomicU64,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new client
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, ClientConnection { id, tx });
        }

        self.connection_count.fetch_add(1, Ordering::Relaxed);
        tracing::info!(connection_id = %id, "Client connected");

        (id, rx)
    }

    /// Unregister a client
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            self.connection_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(connection_id = %id, "Client disconnected");
        }
    }

    /// Broadcast a message to all clients
    pub async fn broadcast(&self, message: HubMessage) {
        let json = match serde_json::to_string(&message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize hub message");
                return;
            }
        };

        let connections = self.connections.read().await;
        for conn in connections.values() {
            if conn.tx.send(json.clone()).is_err() {
                tracing::warn!(connection_id = %conn.id, "Failed to send hub message");
            }
        }
    }

    /// Number of connected clients
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
