//! Live-view state types

use super::pagination;
use crate::grid::SplitMode;
use serde::{Deserialize, Serialize};

/// Default rotation interval in seconds
pub const DEFAULT_AUTOPLAY_SECS: u64 = 10;

/// One camera chosen for live view
///
/// `fixed_index` is the 0-based grid slot the device is pinned to;
/// `None` means floating (eligible for page rotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    pub device_id: String,
    pub fixed_index: Option<usize>,
}

impl DeviceRef {
    pub fn floating(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            fixed_index: None,
        }
    }

    pub fn pinned(device_id: impl Into<String>, index: usize) -> Self {
        Self {
            device_id: device_id.into(),
            fixed_index: Some(index),
        }
    }
}

/// Live-view session state
///
/// Owned exclusively by [`super::LiveViewEngine`]; everything else reads
/// derived snapshots. Invariants: `devices` is unique by `device_id`, no
/// two devices share the same non-null `fixed_index`, and `page` stays in
/// `[1, page_count]`.
#[derive(Debug, Clone)]
pub struct LiveViewState {
    pub devices: Vec<DeviceRef>,
    pub split_mode: SplitMode,
    /// 1-based current page
    pub page: usize,
    pub autoplay: bool,
    pub autoplay_in_seconds: u64,
    /// Device the operator is currently choosing a slot for
    pub fix_selecting_device: Option<DeviceRef>,
}

impl Default for LiveViewState {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            split_mode: SplitMode::default(),
            page: 1,
            autoplay: false,
            autoplay_in_seconds: DEFAULT_AUTOPLAY_SECS,
            fix_selecting_device: None,
        }
    }
}

impl LiveViewState {
    pub fn capacity(&self) -> usize {
        self.split_mode.capacity()
    }

    /// Devices occupying an in-range grid slot
    pub fn fixed_count(&self) -> usize {
        let capacity = self.capacity();
        self.devices
            .iter()
            .filter(|d| d.fixed_index.is_some_and(|i| i < capacity))
            .count()
    }

    pub fn page_count(&self) -> usize {
        pagination::page_count(self.devices.len(), self.fixed_count(), self.capacity())
    }
}

/// Why the engine turned a running autoplay off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoplayStopReason {
    /// A single page already shows every selected camera
    SelectionFitsGrid,
    /// No floating slot is left to rotate through
    GridFullyPinned,
    /// A grid shrink pushed pinned cameras off the wall
    PinsDemoted,
}

impl AutoplayStopReason {
    /// Operator-facing warning text
    pub fn message(self) -> &'static str {
        match self {
            AutoplayStopReason::SelectionFitsGrid => {
                "autoplay turned off: selected cameras ≤ grid size"
            }
            AutoplayStopReason::GridFullyPinned => {
                "autoplay turned off: pinned cameras ≥ grid size"
            }
            AutoplayStopReason::PinsDemoted => {
                "autoplay turned off: pinned cameras moved off the smaller grid"
            }
        }
    }
}

/// Autoplay eligibility check
///
/// Evaluated before letting the operator turn autoplay on, and re-evaluated
/// after every mutation and at every tick while it runs.
pub fn autoplay_blocked(state: &LiveViewState) -> Option<AutoplayStopReason> {
    let capacity = state.capacity();
    if state.devices.len() <= capacity {
        return Some(AutoplayStopReason::SelectionFitsGrid);
    }
    if state.fixed_count() >= capacity {
        return Some(AutoplayStopReason::GridFullyPinned);
    }
    None
}

/// Read snapshot handed to the presentation layer, derived fresh on demand
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveViewSnapshot {
    pub selected_devices: Vec<DeviceRef>,
    /// Exactly `capacity` entries; `None` marks an empty slot
    pub current_page_devices: Vec<Option<DeviceRef>>,
    pub page: usize,
    pub page_count: usize,
    pub split_mode: SplitMode,
    pub autoplay: bool,
    pub autoplay_in_seconds: u64,
    pub fix_selecting_device: Option<DeviceRef>,
}
