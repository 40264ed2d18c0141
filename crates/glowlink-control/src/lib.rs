//! Glowlink Control - sACN Output and Scene Orchestration
//!
//! This crate turns the glowlink-core domain model into packets on the
//! wire:
//! - **sACN (E1.31)**: data and universe-discovery packet construction and
//!   UDP transmission, unicast or multicast
//! - **Universe packing**: splitting a layout's channel stream across
//!   fixed-capacity universes
//! - **Device broadcaster**: per-device periodic send/discovery tasks with
//!   host resolution and reconnect
//! - **Scene orchestrator**: builds live layouts from a scene definition
//!   and reconciles them on hot-patch

#![warn(missing_docs)]

/// Per-device broadcaster tasks
pub mod device;
/// Error types
pub mod error;
/// Scene orchestration
pub mod orchestrator;
/// sACN packet construction and UDP senders
pub mod sacn;
/// DMX universes and channel-range sections
pub mod universe;

pub use device::{DeviceConfig, DeviceOutput, DEFAULT_FPS};
pub use error::{ControlError, Result};
pub use orchestrator::SceneInstance;
pub use sacn::{PacketFactory, SacnSender, MAX_UNIVERSE, SACN_PORT};
pub use universe::{append_channels, Section, Universe, MAX_CHANNELS_PER_UNIVERSE};
