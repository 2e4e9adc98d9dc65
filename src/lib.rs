//! CityOS Live-View Service
//!
//! Split-screen live-view allocation and rotation engine for the CityOS
//! camera wall.
//!
//! ## Architecture (7 Components)
//!
//! 1. GridGeometry - split-mode to column/capacity mapping
//! 2. SlotAllocator - pinned/floating partition and per-page derivation
//! 3. PaginationController - page count and clamping
//! 4. AutoplayScheduler - timer-driven wrapping page rotation
//! 5. ConfigSync - remote hydration + ordered write-through mirror
//! 6. LiveViewEngine - session state owner and intent surface
//! 7. RealtimeHub / WebAPI - distribution and serving surface
//!
//! ## Design Principles
//!
//! - Single owner: all live-view state lives in the LiveViewEngine
//! - Derived views are recomputed from committed state, never cached
//! - Remote sync is write-through and best-effort; local state stays
//!   authoritative for the session

pub mod config_sync;
pub mod device_directory;
pub mod error;
pub mod grid;
pub mod live_view;
pub mod models;
pub mod realtime_hub;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
