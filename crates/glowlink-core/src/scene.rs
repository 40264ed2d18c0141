//! Scene Definition File Model
//!
//! A scene file is a JSON document listing lantern and grid layout
//! definitions: pixel dimensions, physical dimensions, a pose relative to
//! the scene origin and the device bindings that consume their channels.
//! Definitions are persisted configuration; live instances are built from
//! them by the orchestrator and kept in sync via patch.

use std::fs;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::channels::GridWiring;
use crate::{CoreError, Result};

/// Position and single-axis rotation of a layout or scene origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneTransform {
    /// X position in meters
    pub x_pos_meters: f32,
    /// Y position in meters
    pub y_pos_meters: f32,
    /// Z position in meters
    pub z_pos_meters: f32,
    /// Rotation around the vertical (Y) axis, in degrees
    pub y_rotation_angle: f32,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            x_pos_meters: 0.0,
            y_pos_meters: 0.0,
            z_pos_meters: 0.0,
            y_rotation_angle: 0.0,
        }
    }
}

impl SceneTransform {
    /// Convert to a runtime pose
    pub fn pose(&self) -> Pose {
        Pose::new(
            Vec3::new(self.x_pos_meters, self.y_pos_meters, self.z_pos_meters),
            self.y_rotation_angle,
        )
    }
}

/// Runtime pose: position plus Y-axis rotation.
///
/// Interaction events arrive in world space; surfaces store local-space
/// sample positions, so paints transform through the inverse pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    position: Vec3,
    rotation: Quat,
}

impl Pose {
    /// Pose from a position and a Y rotation in degrees
    pub fn new(position: Vec3, y_rotation_degrees: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(y_rotation_degrees.to_radians()),
        }
    }

    /// The identity pose at the origin
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    /// Compose a parent pose with a child pose (child expressed in the
    /// parent's space).
    pub fn compose(&self, child: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * child.position,
            rotation: self.rotation * child.rotation,
        }
    }

    /// Transform a world-space point into this pose's local space
    pub fn world_to_local_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// Transform a world-space direction into this pose's local space
    pub fn world_to_local_dir(&self, dir: Vec3) -> Vec3 {
        self.rotation.inverse() * dir
    }
}

/// One physical output endpoint of a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    /// Target host: dotted IP or DNS name
    pub device_ip: String,
    /// First universe ID this device transmits
    pub start_universe: u16,
    /// LED count consumed from the layout (3 channels per LED)
    pub led_count: usize,
}

impl DeviceDefinition {
    /// DMX channels consumed by this device
    pub fn channel_count(&self) -> usize {
        self.led_count * 3
    }
}

/// Persisted configuration of a planar pixel grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayoutDefinition {
    /// Unique layout name within the scene
    pub name: String,
    /// Pose relative to the scene origin
    #[serde(default)]
    pub transform: SceneTransform,
    /// Wiring pattern of the panel
    pub layout: GridWiring,
    /// Physical width in meters
    pub physical_width_meters: f32,
    /// Physical height in meters
    pub physical_height_meters: f32,
    /// Samples per row
    pub horizontal_panel_pixel_count: usize,
    /// Number of rows
    pub vertical_panel_pixel_count: usize,
    /// Devices consuming successive channel ranges
    pub devices: Vec<DeviceDefinition>,
}

impl GridLayoutDefinition {
    /// DMX channels the grid produces (3 per sample)
    pub fn channel_count(&self) -> usize {
        self.horizontal_panel_pixel_count * self.vertical_panel_pixel_count * 3
    }
}

/// Persisted configuration of a cylindrical lantern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanternLayoutDefinition {
    /// Unique layout name within the scene
    pub name: String,
    /// Pose relative to the scene origin
    #[serde(default)]
    pub transform: SceneTransform,
    /// Physical radius in meters
    pub physical_radius_meters: f32,
    /// Physical height in meters
    pub physical_height_meters: f32,
    /// Samples per row on one panel
    pub horizontal_panel_pixel_count: usize,
    /// Rows per panel
    pub vertical_panel_pixel_count: usize,
    /// Panels stacked vertically
    pub panel_count: usize,
    /// The lantern's single output device
    pub device: DeviceDefinition,
}

impl LanternLayoutDefinition {
    /// DMX channels the lantern produces (3 per sample, all panels stacked)
    pub fn channel_count(&self) -> usize {
        self.horizontal_panel_pixel_count
            * self.vertical_panel_pixel_count
            * self.panel_count
            * 3
    }
}

/// A layout definition of either kind, reconciled by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutDefinition {
    /// Planar pixel grid
    Grid(GridLayoutDefinition),
    /// Cylindrical lantern
    Lantern(LanternLayoutDefinition),
}

impl LayoutDefinition {
    /// The layout's unique name
    pub fn name(&self) -> &str {
        match self {
            LayoutDefinition::Grid(def) => &def.name,
            LayoutDefinition::Lantern(def) => &def.name,
        }
    }

    /// Pose relative to the scene origin
    pub fn transform(&self) -> &SceneTransform {
        match self {
            LayoutDefinition::Grid(def) => &def.transform,
            LayoutDefinition::Lantern(def) => &def.transform,
        }
    }

    /// DMX channels the layout produces
    pub fn channel_count(&self) -> usize {
        match self {
            LayoutDefinition::Grid(def) => def.channel_count(),
            LayoutDefinition::Lantern(def) => def.channel_count(),
        }
    }
}

/// Named collection of layout definitions, loaded from a scene file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    /// Pose of the scene origin relative to the host world origin
    #[serde(default)]
    pub scene_transform: SceneTransform,
    /// Lantern layouts
    #[serde(default)]
    pub lantern_definitions: Vec<LanternLayoutDefinition>,
    /// Grid layouts
    #[serde(default)]
    pub grid_definitions: Vec<GridLayoutDefinition>,
}

impl SceneDefinition {
    /// Parse a scene definition from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: SceneDefinition = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a scene file.
    ///
    /// Errors leave the caller's live scene untouched; callers log and keep
    /// prior state.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let definition = Self::from_json(&json)?;
        tracing::info!(
            "Loaded scene file {} ({} lanterns, {} grids)",
            path.as_ref().display(),
            definition.lantern_definitions.len(),
            definition.grid_definitions.len()
        );
        Ok(definition)
    }

    /// Write the scene file to disk
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// All layout definitions, lanterns first, in file order
    pub fn layout_definitions(&self) -> Vec<LayoutDefinition> {
        let mut definitions = Vec::with_capacity(
            self.lantern_definitions.len() + self.grid_definitions.len(),
        );
        for lantern in &self.lantern_definitions {
            definitions.push(LayoutDefinition::Lantern(lantern.clone()));
        }
        for grid in &self.grid_definitions {
            definitions.push(LayoutDefinition::Grid(grid.clone()));
        }
        definitions
    }

    /// Reject invalid scenes before any instance is built: duplicate layout
    /// names (instances are reconciled by name, so duplicates would alias
    /// one instance), degenerate pixel dimensions, and grid device bindings
    /// that exceed the layout's channel stream.
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        for definition in self.layout_definitions() {
            if !names.insert(definition.name().to_string()) {
                return Err(CoreError::InvalidScene(format!(
                    "duplicate layout name '{}'",
                    definition.name()
                )));
            }
        }

        for grid in &self.grid_definitions {
            if grid.horizontal_panel_pixel_count < 2 || grid.vertical_panel_pixel_count < 2 {
                return Err(CoreError::InvalidScene(format!(
                    "grid '{}' pixel counts must be at least 2x2, got {}x{}",
                    grid.name,
                    grid.horizontal_panel_pixel_count,
                    grid.vertical_panel_pixel_count
                )));
            }

            let bound: usize = grid.devices.iter().map(|d| d.channel_count()).sum();
            if bound > grid.channel_count() {
                return Err(CoreError::InvalidScene(format!(
                    "grid '{}' devices bind {} channels but the layout produces {}",
                    grid.name,
                    bound,
                    grid.channel_count()
                )));
            }
        }

        for lantern in &self.lantern_definitions {
            let rows = lantern.vertical_panel_pixel_count * lantern.panel_count;
            if lantern.horizontal_panel_pixel_count < 2 || rows < 2 {
                return Err(CoreError::InvalidScene(format!(
                    "lantern '{}' pixel counts must be at least 2x2, got {}x{}",
                    lantern.name, lantern.horizontal_panel_pixel_count, rows
                )));
            }
            if lantern.physical_radius_meters <= 0.0 {
                return Err(CoreError::InvalidScene(format!(
                    "lantern '{}' radius must be positive, got {}",
                    lantern.name, lantern.physical_radius_meters
                )));
            }
        }

        Ok(())
    }
}
