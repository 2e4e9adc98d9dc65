//! Live-view engine for the camera wall
//!
//! ## Responsibilities
//!
//! - Selection and pin management (fixed vs. floating devices)
//! - Grid allocation and pagination of the floating rotation
//! - Timer-driven autoplay with self-disable guards
//!
//! The engine is the single owner of the session state; the serving layer
//! only ever sees derived [`LiveViewSnapshot`]s and the intent methods on
//! [`LiveViewEngine`].

pub mod allocator;
pub mod pagination;

mod autoplay;
mod engine;
mod types;

pub use engine::LiveViewEngine;
pub use types::{
    autoplay_blocked, AutoplayStopReason, DeviceRef, LiveViewSnapshot, LiveViewState,
    DEFAULT_AUTOPLAY_SECS,
};
