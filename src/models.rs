//! Shared API models

use crate::live_view::LiveViewSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub connected_clients: u64,
}

/// Live-view snapshot with display names resolved for the wall UI
#[derive(Debug, Clone, Serialize)]
pub struct LabeledLiveView {
    #[serde(flatten)]
    pub view: LiveViewSnapshot,
    /// device_id -> display name; ids without a known name are absent
    pub device_names: HashMap<String, String>,
}
