//! Application state
//!
//! Holds all shared components and state

use crate::device_directory::DeviceDirectory;
use crate::live_view::LiveViewEngine;
use crate::realtime_hub::RealtimeHub;
use std::sync::Arc;
use std::time::Instant;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// CityOS platform API base URL (config store + device metadata)
    pub cityos_api_url: String,
    /// Server port
    pub port: u16,
    /// Server host
    pub host: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cityos_api_url: std::env::var("CITYOS_API_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// LiveViewEngine (session state owner)
    pub engine: Arc<LiveViewEngine>,
    /// DeviceDirectory (slot labels)
    pub directory: Arc<DeviceDirectory>,
    /// RealtimeHub (WebSocket)
    pub realtime: Arc<RealtimeHub>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}
