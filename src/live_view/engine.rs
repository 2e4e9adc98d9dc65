//! LiveViewEngine - owner of the split-screen session state
//!
//! ## Responsibilities
//!
//! - Single owner of the live-view selection and page state
//! - Intent surface for the wall UI (select/pin/page/split/autoplay)
//! - Write-through of every persisted mutation to the config store
//! - Autoplay lifecycle (start/stop/restart, forced disable)
//!
//! All mutation happens synchronously under the state lock; derived
//! values (current page devices, page count, autoplay eligibility) are
//! recomputed from the committed state on every read, never cached.

use super::allocator;
use super::autoplay::AutoplayScheduler;
use super::pagination;
use super::types::{
    autoplay_blocked, AutoplayStopReason, DeviceRef, LiveViewSnapshot, LiveViewState,
};
use crate::config_sync::{ConfigSyncHandle, LiveViewConfig, LiveViewPatch, WireDevice};
use crate::error::{Error, Result};
use crate::grid::SplitMode;
use crate::realtime_hub::{AutoplayDisabledMessage, HubMessage, RealtimeHub};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};

/// State and side channels shared with the autoplay timer task
pub(super) struct EngineShared {
    pub(super) state: RwLock<LiveViewState>,
    pub(super) hub: Arc<RealtimeHub>,
    pub(super) sync: ConfigSyncHandle,
}

impl EngineShared {
    /// Derive the presentation snapshot from committed state
    pub(super) fn snapshot_of(state: &LiveViewState) -> LiveViewSnapshot {
        let capacity = state.capacity();
        let allocation = allocator::allocate(&state.devices, capacity);
        LiveViewSnapshot {
            selected_devices: state.devices.clone(),
            current_page_devices: allocator::page_devices(&allocation, state.page),
            page: state.page,
            page_count: state.page_count(),
            split_mode: state.split_mode,
            autoplay: state.autoplay,
            autoplay_in_seconds: state.autoplay_in_seconds,
            fix_selecting_device: state.fix_selecting_device.clone(),
        }
    }

    pub(super) async fn broadcast_view(&self, state: &LiveViewState) {
        self.hub
            .broadcast(HubMessage::LiveViewUpdate(Self::snapshot_of(state)))
            .await;
    }

    /// Turn a running autoplay off and tell the operator why.
    ///
    /// The page keeps its last valid value; only the flag changes (and is
    /// pushed so the remote store agrees).
    pub(super) async fn force_disable_autoplay(
        &self,
        state: &mut LiveViewState,
        reason: AutoplayStopReason,
    ) {
        state.autoplay = false;
        self.sync.push(LiveViewPatch::autoplay(false));
        tracing::warn!(reason = ?reason, "{}", reason.message());
        self.hub
            .broadcast(HubMessage::AutoplayDisabled(AutoplayDisabledMessage::new(
                reason,
            )))
            .await;
    }
}

/// Aggregate engine exposed to the serving layer
pub struct LiveViewEngine {
    shared: Arc<EngineShared>,
    autoplay: AutoplayScheduler,
}

impl LiveViewEngine {
    pub fn new(hub: Arc<RealtimeHub>, sync: ConfigSyncHandle) -> Self {
        let shared = Arc::new(EngineShared {
            state: RwLock::new(LiveViewState::default()),
            hub,
            sync,
        });
        let autoplay = AutoplayScheduler::new(shared.clone());
        Self { shared, autoplay }
    }

    /// Seed state from the persisted remote configuration.
    ///
    /// Absent fields keep the local defaults. A hydrated autoplay flag
    /// that is not currently allowed is disabled immediately (with the
    /// usual warning and a corrective push) instead of starting a timer.
    pub async fn hydrate(&self, config: LiveViewConfig) {
        let mut state = self.shared.state.write().await;

        if let Some(devices) = config.devices {
            let mut seen = std::collections::HashSet::new();
            state.devices = devices
                .into_iter()
                .map(DeviceRef::from)
                .filter(|d| seen.insert(d.device_id.clone()))
                .collect();
        }
        if let Some(mode) = config.split_mode {
            state.split_mode = mode;
        }
        if let Some(autoplay) = config.autoplay {
            state.autoplay = autoplay;
        }
        if let Some(seconds) = config.autoplay_in_seconds {
            if seconds > 0 {
                state.autoplay_in_seconds = seconds;
            }
        }
        state.page = pagination::clamp_page(state.page, state.page_count());

        if state.autoplay {
            if let Some(reason) = autoplay_blocked(&state) {
                self.shared.force_disable_autoplay(&mut state, reason).await;
            } else {
                self.autoplay.start().await;
            }
        }

        tracing::info!(
            devices = state.devices.len(),
            split_mode = ?state.split_mode,
            autoplay = state.autoplay,
            "Live-view state hydrated"
        );
    }

    /// Current view, derived fresh from committed state
    pub async fn view(&self) -> LiveViewSnapshot {
        let state = self.shared.state.read().await;
        EngineShared::snapshot_of(&state)
    }

    /// Add a camera to the selection as a floating device.
    /// Re-selecting an already selected camera has no effect.
    pub async fn select_device(&self, device_id: &str) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        if state.devices.iter().all(|d| d.device_id != device_id) {
            state.devices.push(DeviceRef::floating(device_id));
            state.page = pagination::clamp_page(state.page, state.page_count());
            self.shared.sync.push(LiveViewPatch::devices(&state.devices));
        }
        self.finish_mutation(state).await
    }

    /// Remove a camera from the selection
    pub async fn deselect_device(&self, device_id: &str) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        let before = state.devices.len();
        state.devices.retain(|d| d.device_id != device_id);
        if state.devices.len() != before {
            if state
                .fix_selecting_device
                .as_ref()
                .is_some_and(|d| d.device_id == device_id)
            {
                state.fix_selecting_device = None;
            }
            state.page = pagination::clamp_page(state.page, state.page_count());
            self.shared.sync.push(LiveViewPatch::devices(&state.devices));
        }
        self.finish_mutation(state).await
    }

    /// Pin a selected camera to a grid slot.
    ///
    /// A camera already pinned to that slot is demoted to floating, so no
    /// two devices ever share a slot.
    pub async fn pin_device(&self, device_id: &str, slot_index: usize) -> Result<LiveViewSnapshot> {
        let mut state = self.shared.state.write().await;
        let capacity = state.capacity();
        if slot_index >= capacity {
            return Err(Error::Validation(format!(
                "slot {} out of range for a {}-slot grid",
                slot_index, capacity
            )));
        }
        if state.devices.iter().all(|d| d.device_id != device_id) {
            return Err(Error::NotFound(format!(
                "device {} is not selected",
                device_id
            )));
        }

        for device in state.devices.iter_mut() {
            if device.device_id == device_id {
                device.fixed_index = Some(slot_index);
            } else if device.fixed_index == Some(slot_index) {
                device.fixed_index = None;
            }
        }
        state.fix_selecting_device = None;
        state.page = pagination::clamp_page(state.page, state.page_count());
        self.shared.sync.push(LiveViewPatch::devices(&state.devices));

        Ok(self.finish_mutation(state).await)
    }

    /// Release a camera's pin, returning it to the rotation
    pub async fn unpin_device(&self, device_id: &str) -> Result<LiveViewSnapshot> {
        let mut state = self.shared.state.write().await;
        let device = state
            .devices
            .iter_mut()
            .find(|d| d.device_id == device_id)
            .ok_or_else(|| Error::NotFound(format!("device {} is not selected", device_id)))?;

        if device.fixed_index.take().is_some() {
            state.page = pagination::clamp_page(state.page, state.page_count());
            self.shared.sync.push(LiveViewPatch::devices(&state.devices));
        }
        Ok(self.finish_mutation(state).await)
    }

    /// Mark a camera as awaiting a slot choice
    pub async fn begin_fix_selection(&self, device_id: &str) -> Result<LiveViewSnapshot> {
        let mut state = self.shared.state.write().await;
        let device = state
            .devices
            .iter()
            .find(|d| d.device_id == device_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("device {} is not selected", device_id)))?;

        state.fix_selecting_device = Some(device);
        self.shared.broadcast_view(&state).await;
        Ok(EngineShared::snapshot_of(&state))
    }

    /// Drop the pending slot choice
    pub async fn cancel_fix_selection(&self) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        state.fix_selecting_device = None;
        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }

    /// Change the wall grid size.
    ///
    /// Pins that no longer fit are demoted to floating. That is a
    /// persisted selection change, not just a view change, and under
    /// running autoplay it turns the rotation off with a warning. The
    /// page always resets to 1 and a surviving autoplay restarts its
    /// countdown.
    pub async fn set_split_mode(&self, mode: SplitMode) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        state.split_mode = mode;
        let capacity = mode.capacity();

        let mut demoted = false;
        for device in state.devices.iter_mut() {
            if device.fixed_index.is_some_and(|index| index >= capacity) {
                device.fixed_index = None;
                demoted = true;
            }
        }
        state.page = 1;

        let mut patch = LiveViewPatch::split_mode(mode);
        if demoted {
            patch.devices = Some(WireDevice::from_refs(&state.devices));
        }
        self.shared.sync.push(patch);

        if state.autoplay {
            if demoted {
                self.shared
                    .force_disable_autoplay(&mut state, AutoplayStopReason::PinsDemoted)
                    .await;
                self.autoplay.stop().await;
            } else if let Some(reason) = autoplay_blocked(&state) {
                self.shared.force_disable_autoplay(&mut state, reason).await;
                self.autoplay.stop().await;
            } else {
                self.autoplay.restart().await;
            }
        }

        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }

    /// Jump to a page; out-of-range values clamp to the nearest bound
    pub async fn set_page(&self, page: usize) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        state.page = pagination::clamp_page(page, state.page_count());
        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }

    /// Manual navigation forwards; stops at the last page
    pub async fn next_page(&self) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        state.page = pagination::next_page(state.page, state.page_count());
        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }

    /// Manual navigation backwards; stops at the first page
    pub async fn prev_page(&self) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        state.page = pagination::prev_page(state.page);
        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }

    /// Toggle autoplay.
    ///
    /// Enabling while the rotation would have nothing to do is rejected
    /// silently: the toggle has no effect and no error is raised.
    pub async fn set_autoplay(&self, enabled: bool) -> LiveViewSnapshot {
        let mut state = self.shared.state.write().await;
        if enabled == state.autoplay {
            return EngineShared::snapshot_of(&state);
        }

        if enabled {
            if let Some(reason) = autoplay_blocked(&state) {
                tracing::debug!(reason = ?reason, "Autoplay enable rejected");
                return EngineShared::snapshot_of(&state);
            }
            state.autoplay = true;
            self.shared.sync.push(LiveViewPatch::autoplay(true));
            self.autoplay.start().await;
        } else {
            state.autoplay = false;
            self.shared.sync.push(LiveViewPatch::autoplay(false));
            self.autoplay.stop().await;
        }

        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }

    /// Change the rotation interval; a running countdown restarts from
    /// the new baseline
    pub async fn set_autoplay_in_seconds(&self, seconds: u64) -> Result<LiveViewSnapshot> {
        if seconds == 0 {
            return Err(Error::Validation(
                "autoplay interval must be positive".to_string(),
            ));
        }

        let mut state = self.shared.state.write().await;
        state.autoplay_in_seconds = seconds;
        self.shared
            .sync
            .push(LiveViewPatch::autoplay_in_seconds(seconds));
        if state.autoplay {
            self.autoplay.restart().await;
        }

        self.shared.broadcast_view(&state).await;
        Ok(EngineShared::snapshot_of(&state))
    }

    /// Cancel the rotation timer on teardown
    pub async fn shutdown(&self) {
        self.autoplay.stop().await;
    }

    /// Common tail for selection mutations: a running autoplay that is no
    /// longer allowed is turned off before the new view goes out.
    async fn finish_mutation(
        &self,
        mut state: RwLockWriteGuard<'_, LiveViewState>,
    ) -> LiveViewSnapshot {
        if state.autoplay {
            if let Some(reason) = autoplay_blocked(&state) {
                self.shared.force_disable_autoplay(&mut state, reason).await;
                self.autoplay.stop().await;
            }
        }
        self.shared.broadcast_view(&state).await;
        EngineShared::snapshot_of(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_sync;
    use tokio::sync::mpsc;

    fn test_engine() -> (
        LiveViewEngine,
        mpsc::UnboundedReceiver<LiveViewPatch>,
        Arc<RealtimeHub>,
    ) {
        let hub = Arc::new(RealtimeHub::new());
        let (handle, rx) = config_sync::channel();
        (LiveViewEngine::new(hub.clone(), handle), rx, hub)
    }

    async fn select_cameras(engine: &LiveViewEngine, count: usize) {
        for i in 0..count {
            engine.select_device(&format!("cam{i}")).await;
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<LiveViewPatch>) -> Vec<LiveViewPatch> {
        let mut patches = Vec::new();
        while let Ok(patch) = rx.try_recv() {
            patches.push(patch);
        }
        patches
    }

    #[tokio::test]
    async fn selection_is_unique_by_device_id() {
        let (engine, mut rx, _hub) = test_engine();
        engine.select_device("cam1").await;
        let view = engine.select_device("cam1").await;

        assert_eq!(view.selected_devices.len(), 1);
        // only the first select produced a patch
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn pinning_evicts_the_previous_slot_holder() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 3).await;

        engine.pin_device("cam0", 0).await.unwrap();
        let view = engine.pin_device("cam1", 0).await.unwrap();

        let cam0 = view
            .selected_devices
            .iter()
            .find(|d| d.device_id == "cam0")
            .unwrap();
        let cam1 = view
            .selected_devices
            .iter()
            .find(|d| d.device_id == "cam1")
            .unwrap();
        assert_eq!(cam0.fixed_index, None);
        assert_eq!(cam1.fixed_index, Some(0));

        let pinned: Vec<usize> = view
            .selected_devices
            .iter()
            .filter_map(|d| d.fixed_index)
            .collect();
        assert_eq!(pinned, vec![0]);
    }

    #[tokio::test]
    async fn pin_rejects_out_of_range_slot_and_unknown_device() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 2).await;

        assert!(matches!(
            engine.pin_device("cam0", 4).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            engine.pin_device("ghost", 0).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn grid_shrink_demotes_out_of_range_pins_and_persists() {
        let (engine, mut rx, _hub) = test_engine();
        engine.set_split_mode(SplitMode::Sixteen).await;
        select_cameras(&engine, 6).await;
        engine.pin_device("cam5", 5).await.unwrap();
        drain(&mut rx);

        let view = engine.set_split_mode(SplitMode::Four).await;

        let cam5 = view
            .selected_devices
            .iter()
            .find(|d| d.device_id == "cam5")
            .unwrap();
        assert_eq!(cam5.fixed_index, None);
        assert_eq!(view.page, 1);

        // one patch carrying both the new mode and the demoted selection
        let patches = drain(&mut rx);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].split_mode, Some(SplitMode::Four));
        let devices = patches[0].devices.as_ref().unwrap();
        assert!(devices.iter().all(|d| d.fixed_index.is_none()));
    }

    #[tokio::test]
    async fn page_clamps_when_the_selection_shrinks() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 10).await;

        let view = engine.set_page(3).await;
        assert_eq!(view.page, 3);
        assert_eq!(view.page_count, 3);

        // dropping to 5 devices leaves 2 pages
        for i in 5..10 {
            engine.deselect_device(&format!("cam{i}")).await;
        }
        let view = engine.view().await;
        assert_eq!(view.page_count, 2);
        assert_eq!(view.page, 2);
    }

    #[tokio::test]
    async fn set_page_clamps_to_bounds() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 10).await;

        assert_eq!(engine.set_page(99).await.page, 3);
        assert_eq!(engine.set_page(0).await.page, 1);
    }

    #[tokio::test]
    async fn manual_navigation_does_not_wrap() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 10).await;

        assert_eq!(engine.prev_page().await.page, 1);
        engine.set_page(3).await;
        assert_eq!(engine.next_page().await.page, 3);
    }

    #[tokio::test]
    async fn autoplay_enable_is_rejected_when_everything_fits() {
        let (engine, mut rx, _hub) = test_engine();
        select_cameras(&engine, 4).await;
        drain(&mut rx);

        let view = engine.set_autoplay(true).await;
        assert!(!view.autoplay);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn over_pinning_turns_running_autoplay_off_in_place() {
        let (engine, mut rx, hub) = test_engine();
        select_cameras(&engine, 5).await;
        engine.set_autoplay(true).await;
        assert!(engine.view().await.autoplay);
        let (_id, mut hub_rx) = hub.register().await;
        drain(&mut rx);

        for i in 0..4 {
            engine.pin_device(&format!("cam{i}"), i).await.unwrap();
        }

        let view = engine.view().await;
        assert!(!view.autoplay);
        assert_eq!(view.page, 1);

        // the corrective push went out
        let patches = drain(&mut rx);
        assert!(patches.contains(&LiveViewPatch::autoplay(false)));

        // and the warning reached the wall
        let mut saw_warning = false;
        while let Ok(json) = hub_rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            if value["type"] == "autoplay_disabled" {
                assert_eq!(value["data"]["reason"], "grid_fully_pinned");
                saw_warning = true;
            }
        }
        assert!(saw_warning);
    }

    #[tokio::test]
    async fn selection_shrink_below_grid_size_disables_autoplay() {
        let (engine, mut rx, _hub) = test_engine();
        select_cameras(&engine, 5).await;
        engine.set_autoplay(true).await;
        drain(&mut rx);

        engine.deselect_device("cam4").await;

        let view = engine.view().await;
        assert!(!view.autoplay);
        let patches = drain(&mut rx);
        assert!(patches.contains(&LiveViewPatch::autoplay(false)));
    }

    #[tokio::test]
    async fn demotion_under_running_autoplay_disables_it() {
        let (engine, mut rx, hub) = test_engine();
        engine.set_split_mode(SplitMode::Sixteen).await;
        select_cameras(&engine, 20).await;
        engine.pin_device("cam0", 10).await.unwrap();
        engine.set_autoplay(true).await;
        let (_id, mut hub_rx) = hub.register().await;
        drain(&mut rx);

        let view = engine.set_split_mode(SplitMode::Nine).await;
        assert!(!view.autoplay);

        let mut saw_warning = false;
        while let Ok(json) = hub_rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            if value["type"] == "autoplay_disabled" {
                assert_eq!(value["data"]["reason"], "pins_demoted");
                saw_warning = true;
            }
        }
        assert!(saw_warning);
    }

    #[tokio::test]
    async fn patches_preserve_issuance_order() {
        let (engine, mut rx, _hub) = test_engine();
        engine.select_device("a").await;
        engine.select_device("b").await;
        engine.set_split_mode(SplitMode::Nine).await;

        let patches = drain(&mut rx);
        assert_eq!(patches.len(), 3);
        assert_eq!(patches[0].devices.as_ref().unwrap().len(), 1);
        assert_eq!(patches[1].devices.as_ref().unwrap().len(), 2);
        assert_eq!(patches[2].split_mode, Some(SplitMode::Nine));
    }

    #[tokio::test]
    async fn page_changes_are_not_persisted() {
        let (engine, mut rx, _hub) = test_engine();
        select_cameras(&engine, 10).await;
        drain(&mut rx);

        engine.set_page(2).await;
        engine.next_page().await;
        engine.prev_page().await;

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn interval_must_be_positive() {
        let (engine, _rx, _hub) = test_engine();
        assert!(matches!(
            engine.set_autoplay_in_seconds(0).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn hydrate_keeps_defaults_for_absent_fields() {
        let (engine, _rx, _hub) = test_engine();
        engine.hydrate(LiveViewConfig::default()).await;

        let view = engine.view().await;
        assert!(view.selected_devices.is_empty());
        assert_eq!(view.split_mode, SplitMode::Four);
        assert!(!view.autoplay);
        assert_eq!(view.autoplay_in_seconds, 10);
    }

    #[tokio::test]
    async fn hydrate_seeds_present_fields() {
        let (engine, _rx, _hub) = test_engine();
        let config: LiveViewConfig = serde_json::from_value(serde_json::json!({
            "devices": [
                {"deviceId": "cam0", "fixedIndex": 2},
                {"deviceId": "cam1"},
                {"deviceId": "cam1"}
            ],
            "splitMode": "NINE",
            "autoplayInSeconds": 45
        }))
        .unwrap();
        engine.hydrate(config).await;

        let view = engine.view().await;
        // duplicate entries collapse to the first occurrence
        assert_eq!(view.selected_devices.len(), 2);
        assert_eq!(view.selected_devices[0].fixed_index, Some(2));
        assert_eq!(view.split_mode, SplitMode::Nine);
        assert_eq!(view.autoplay_in_seconds, 45);
    }

    #[tokio::test]
    async fn hydrated_autoplay_under_disallowed_state_is_corrected() {
        let (engine, mut rx, _hub) = test_engine();
        let config: LiveViewConfig = serde_json::from_value(serde_json::json!({
            "devices": [{"deviceId": "cam0"}],
            "autoplay": true
        }))
        .unwrap();
        engine.hydrate(config).await;

        let view = engine.view().await;
        assert!(!view.autoplay);
        assert_eq!(drain(&mut rx), vec![LiveViewPatch::autoplay(false)]);
    }

    #[tokio::test]
    async fn derived_view_has_exactly_capacity_slots() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 3).await;
        for mode in SplitMode::ALL {
            let view = engine.set_split_mode(mode).await;
            assert_eq!(view.current_page_devices.len(), mode.capacity());
        }
    }

    #[tokio::test]
    async fn fix_selection_lifecycle() {
        let (engine, _rx, _hub) = test_engine();
        select_cameras(&engine, 2).await;

        let view = engine.begin_fix_selection("cam1").await.unwrap();
        assert_eq!(
            view.fix_selecting_device.as_ref().map(|d| d.device_id.as_str()),
            Some("cam1")
        );

        // pinning resolves the pending choice
        let view = engine.pin_device("cam1", 0).await.unwrap();
        assert!(view.fix_selecting_device.is_none());

        engine.begin_fix_selection("cam0").await.unwrap();
        let view = engine.cancel_fix_selection().await;
        assert!(view.fix_selecting_device.is_none());
    }
}
