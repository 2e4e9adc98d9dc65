//! Slot allocation for the split-screen wall
//!
//! Pure derivation from the selection: pinned devices keep their slot on
//! every page, floating devices fill the remaining slots page by page.
//! Nothing here mutates the selection; grid-shrink demotion is an engine
//! concern.

use super::types::DeviceRef;

/// Partition of the selection for one grid capacity
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Indexed by slot; `None` where no pin exists
    pub fixed_slots: Vec<Option<DeviceRef>>,
    /// Floating devices in selection order (includes out-of-range pins)
    pub unfixed: Vec<DeviceRef>,
}

impl Allocation {
    pub fn occupied_fixed(&self) -> usize {
        self.fixed_slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Floating slots available on each page
    pub fn unfixed_per_page(&self) -> usize {
        self.fixed_slots.len() - self.occupied_fixed()
    }
}

/// Split the selection into pinned slots and floating devices.
///
/// A pin at or beyond `capacity` behaves as floating. On a pin-index
/// collision the last device wins the slot; the loser is dropped from the
/// derived view (collisions violate a caller invariant and are tolerated,
/// not modeled).
pub fn allocate(devices: &[DeviceRef], capacity: usize) -> Allocation {
    let mut fixed_slots = vec![None; capacity];
    let mut unfixed = Vec::new();

    for device in devices {
        match device.fixed_index {
            Some(index) if index < capacity => fixed_slots[index] = Some(device.clone()),
            _ => unfixed.push(device.clone()),
        }
    }

    Allocation {
        fixed_slots,
        unfixed,
    }
}

/// Devices shown on `page` (1-based), exactly `capacity` entries.
///
/// The page's window of floating devices fills the unpinned slots left to
/// right; slots past the end of the window stay empty.
pub fn page_devices(allocation: &Allocation, page: usize) -> Vec<Option<DeviceRef>> {
    let per_page = allocation.unfixed_per_page();
    let start = page.saturating_sub(1) * per_page;
    let window: &[DeviceRef] = if start < allocation.unfixed.len() {
        let end = (start + per_page).min(allocation.unfixed.len());
        &allocation.unfixed[start..end]
    } else {
        &[]
    };
    let mut window = window.iter();

    allocation
        .fixed_slots
        .iter()
        .map(|slot| match slot {
            Some(device) => Some(device.clone()),
            None => window.next().cloned(),
        })
        .collect()
}
