//! Wire types for the CityOS live-view configuration store
//!
//! The platform API speaks camelCase JSON; these types stay at the
//! interface boundary and convert to the engine's own [`DeviceRef`].

use crate::grid::SplitMode;
use crate::live_view::DeviceRef;
use serde::{Deserialize, Serialize};

/// Device entry as persisted remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDevice {
    pub device_id: String,
    #[serde(default)]
    pub fixed_index: Option<usize>,
}

impl WireDevice {
    pub fn from_refs(devices: &[DeviceRef]) -> Vec<WireDevice> {
        devices.iter().map(WireDevice::from).collect()
    }
}

impl From<&DeviceRef> for WireDevice {
    fn from(device: &DeviceRef) -> Self {
        Self {
            device_id: device.device_id.clone(),
            fixed_index: device.fixed_index,
        }
    }
}

impl From<WireDevice> for DeviceRef {
    fn from(wire: WireDevice) -> Self {
        Self {
            device_id: wire.device_id,
            fixed_index: wire.fixed_index,
        }
    }
}

/// Persisted live-view configuration, as read at startup
///
/// Every field is optional: absent or null fields keep the local defaults,
/// so a sparse or malformed document is never fatal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveViewConfig {
    pub devices: Option<Vec<WireDevice>>,
    pub split_mode: Option<SplitMode>,
    pub autoplay: Option<bool>,
    pub autoplay_in_seconds: Option<u64>,
}

/// Partial update pushed after a local mutation
///
/// Carries only the fields that changed; everything else is omitted from
/// the serialized document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveViewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<WireDevice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_mode: Option<SplitMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay_in_seconds: Option<u64>,
}

impl LiveViewPatch {
    pub fn devices(devices: &[DeviceRef]) -> Self {
        Self {
            devices: Some(WireDevice::from_refs(devices)),
            ..Default::default()
        }
    }

    pub fn split_mode(mode: SplitMode) -> Self {
        Self {
            split_mode: Some(mode),
            ..Default::default()
        }
    }

    pub fn autoplay(enabled: bool) -> Self {
        Self {
            autoplay: Some(enabled),
            ..Default::default()
        }
    }

    pub fn autoplay_in_seconds(seconds: u64) -> Self {
        Self {
            autoplay_in_seconds: Some(seconds),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_none()
            && self.split_mode.is_none()
            && self.autoplay.is_none()
            && self.autoplay_in_seconds.is_none()
    }
}
