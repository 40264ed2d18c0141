//! Layout Instances - Live Pixel Fixtures Built From Definitions
//!
//! A layout instance couples a pixel surface with its channel table and the
//! shared channel byte buffer read by the network layer. The two concrete
//! kinds (planar grid, cylindrical lantern) form a closed variant set and
//! dispatch by match; there is no open inheritance.
//!
//! Per frame, the host calls `tick(dt, decay_rate)` on every instance:
//! decay runs first, then the frame's colors are flushed through the table
//! into the channel buffer under a single short lock. Paint calls arrive
//! between ticks, on the same render thread.

use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use crate::channels::ChannelTable;
use crate::color::Rgb;
use crate::scene::{GridLayoutDefinition, LanternLayoutDefinition, LayoutDefinition, Pose};
use crate::surface::PixelSurface;
use crate::Result;

/// Channel byte buffer shared between the render domain (writer, once per
/// frame) and the network send tasks (readers, once per send tick).
pub type SharedChannels = Arc<Mutex<Vec<u8>>>;

/// A live planar pixel grid
#[derive(Debug)]
pub struct GridLayout {
    name: String,
    physical_width_meters: f32,
    physical_height_meters: f32,
    pose: Pose,
    surface: PixelSurface,
    table: ChannelTable,
    channels: SharedChannels,
}

impl GridLayout {
    /// Build a grid instance from its definition, posed under `scene_pose`
    pub fn new(definition: &GridLayoutDefinition, scene_pose: &Pose) -> Result<Self> {
        let surface = PixelSurface::planar_grid(
            definition.physical_width_meters,
            definition.physical_height_meters,
            definition.horizontal_panel_pixel_count,
            definition.vertical_panel_pixel_count,
        )?;
        let table = ChannelTable::for_grid(
            definition.layout,
            definition.horizontal_panel_pixel_count,
            definition.vertical_panel_pixel_count,
        );
        let channels = Arc::new(Mutex::new(vec![0u8; surface.len() * 3]));

        Ok(Self {
            name: definition.name.clone(),
            physical_width_meters: definition.physical_width_meters,
            physical_height_meters: definition.physical_height_meters,
            pose: scene_pose.compose(&definition.transform.pose()),
            surface,
            table,
            channels,
        })
    }

    /// Project a box emitter onto the grid plane and paint around the
    /// projected center. Skips the sample pass entirely when the projection
    /// falls outside the grid bounds inflated by the box size.
    pub fn paint_projected_box(
        &mut self,
        world_center: Vec3,
        world_x_axis: Vec3,
        world_y_axis: Vec3,
        world_z_axis: Vec3,
        half_size: f32,
        color: Rgb,
    ) {
        let local = self.pose.world_to_local_point(world_center);

        // Grid plane is local x = 0; +Z horizontal, +Y vertical
        let horizontal_extent = self.physical_width_meters * 0.5 + half_size;
        let vertical_extent = self.physical_height_meters * 0.5 + half_size;
        if local.z.abs() > horizontal_extent || local.y.abs() > vertical_extent {
            return;
        }

        let projected = Vec3::new(0.0, local.y, local.z);
        self.surface.paint_box(
            projected,
            self.pose.world_to_local_dir(world_x_axis),
            self.pose.world_to_local_dir(world_y_axis),
            self.pose.world_to_local_dir(world_z_axis),
            Vec3::splat(half_size),
            color,
        );
    }
}

/// A live cylindrical lantern
#[derive(Debug)]
pub struct LanternLayout {
    name: String,
    pose: Pose,
    surface: PixelSurface,
    table: ChannelTable,
    channels: SharedChannels,
}

impl LanternLayout {
    /// Build a lantern instance from its definition, posed under
    /// `scene_pose`. Panels stack vertically: the sample grid is
    /// `per_row x (panel_rows * panel_count)` over the full height.
    pub fn new(definition: &LanternLayoutDefinition, scene_pose: &Pose) -> Result<Self> {
        let rows = definition.vertical_panel_pixel_count * definition.panel_count;
        let surface = PixelSurface::cylinder(
            definition.physical_radius_meters,
            definition.physical_height_meters,
            definition.horizontal_panel_pixel_count,
            rows,
        )?;
        let table = ChannelTable::lantern_serial(
            definition.horizontal_panel_pixel_count,
            definition.vertical_panel_pixel_count,
            definition.panel_count,
        );
        let channels = Arc::new(Mutex::new(vec![0u8; surface.len() * 3]));

        Ok(Self {
            name: definition.name.clone(),
            pose: scene_pose.compose(&definition.transform.pose()),
            surface,
            table,
            channels,
        })
    }
}

/// A live layout of either kind
#[derive(Debug)]
pub enum LayoutInstance {
    /// Planar pixel grid
    Grid(GridLayout),
    /// Cylindrical lantern
    Lantern(LanternLayout),
}

impl LayoutInstance {
    /// Build an instance for a definition, posed under `scene_pose`
    pub fn from_definition(definition: &LayoutDefinition, scene_pose: &Pose) -> Result<Self> {
        match definition {
            LayoutDefinition::Grid(def) => Ok(LayoutInstance::Grid(GridLayout::new(def, scene_pose)?)),
            LayoutDefinition::Lantern(def) => {
                Ok(LayoutInstance::Lantern(LanternLayout::new(def, scene_pose)?))
            }
        }
    }

    /// The layout's unique name
    pub fn name(&self) -> &str {
        match self {
            LayoutInstance::Grid(grid) => &grid.name,
            LayoutInstance::Lantern(lantern) => &lantern.name,
        }
    }

    /// Total DMX channels produced by this layout (3 per sample)
    pub fn num_channels(&self) -> usize {
        self.surface().len() * 3
    }

    /// Handle to the shared channel buffer consumed by device outputs
    pub fn channels(&self) -> SharedChannels {
        match self {
            LayoutInstance::Grid(grid) => Arc::clone(&grid.channels),
            LayoutInstance::Lantern(lantern) => Arc::clone(&lantern.channels),
        }
    }

    /// The live pixel surface
    pub fn surface(&self) -> &PixelSurface {
        match self {
            LayoutInstance::Grid(grid) => &grid.surface,
            LayoutInstance::Lantern(lantern) => &lantern.surface,
        }
    }

    /// Re-pose the instance from its definition's transform. Pixel state is
    /// untouched, so a patch that only moves a fixture keeps its colors.
    pub fn set_pose(&mut self, definition: &LayoutDefinition, scene_pose: &Pose) {
        let pose = scene_pose.compose(&definition.transform().pose());
        match self {
            LayoutInstance::Grid(grid) => grid.pose = pose,
            LayoutInstance::Lantern(lantern) => lantern.pose = pose,
        }
    }

    /// Per-frame update: fade toward black, then flush this frame's colors
    /// through the channel table into the shared channel buffer.
    pub fn tick(&mut self, delta_seconds: f32, decay_rate: f32) {
        match self {
            LayoutInstance::Grid(grid) => {
                grid.surface.decay(delta_seconds, decay_rate);
                let mut channels = grid.channels.lock();
                grid.table.write_channels(grid.surface.colors(), &mut channels);
            }
            LayoutInstance::Lantern(lantern) => {
                lantern.surface.decay(delta_seconds, decay_rate);
                let mut channels = lantern.channels.lock();
                lantern
                    .table
                    .write_channels(lantern.surface.colors(), &mut channels);
            }
        }
    }

    /// Paint a world-space segment emitter onto the surface
    pub fn paint_segment(&mut self, world_start: Vec3, world_end: Vec3, radius: f32, color: Rgb) {
        let (pose, surface) = match self {
            LayoutInstance::Grid(grid) => (&grid.pose, &mut grid.surface),
            LayoutInstance::Lantern(lantern) => (&lantern.pose, &mut lantern.surface),
        };
        surface.paint_segment(
            pose.world_to_local_point(world_start),
            pose.world_to_local_point(world_end),
            radius,
            color,
        );
    }

    /// Paint a world-space oriented box onto the surface. Grids project the
    /// box onto their plane first and early-out when it misses the panel.
    pub fn paint_box(
        &mut self,
        world_center: Vec3,
        world_x_axis: Vec3,
        world_y_axis: Vec3,
        world_z_axis: Vec3,
        half_size: f32,
        color: Rgb,
    ) {
        match self {
            LayoutInstance::Grid(grid) => grid.paint_projected_box(
                world_center,
                world_x_axis,
                world_y_axis,
                world_z_axis,
                half_size,
                color,
            ),
            LayoutInstance::Lantern(lantern) => lantern.surface.paint_box(
                lantern.pose.world_to_local_point(world_center),
                lantern.pose.world_to_local_dir(world_x_axis),
                lantern.pose.world_to_local_dir(world_y_axis),
                lantern.pose.world_to_local_dir(world_z_axis),
                Vec3::splat(half_size),
                color,
            ),
        }
    }
}
