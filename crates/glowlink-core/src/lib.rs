//! Glowlink Core - Domain Model for LED Fixture Control
//!
//! This crate contains the domain model for Glowlink, including:
//! - Segment/box overlap math for LED sample hit-testing
//! - Pixel surfaces with color decay and spatial paint
//! - Serpentine channel tables mapping samples to LED wire order
//! - Grid and lantern layout instances
//! - Scene definition file format

#![warn(missing_docs)]

pub use glam::{Quat, Vec3};

/// Serpentine channel tables
pub mod channels;
/// Color samples and blend rules
pub mod color;
/// Error types
pub mod error;
/// Live layout instances
pub mod layout;
/// Overlap tests
pub mod math;
/// Scene definition file model
pub mod scene;
/// Runtime paint tuning
pub mod settings;
/// Per-sample color state
pub mod surface;

pub use channels::{ChannelTable, GridWiring};
pub use color::Rgb;
pub use error::{CoreError, Result};
pub use layout::{GridLayout, LanternLayout, LayoutInstance, SharedChannels};
pub use scene::{
    DeviceDefinition, GridLayoutDefinition, LanternLayoutDefinition, LayoutDefinition, Pose,
    SceneDefinition, SceneTransform,
};
pub use settings::PaintSettings;
pub use surface::PixelSurface;
