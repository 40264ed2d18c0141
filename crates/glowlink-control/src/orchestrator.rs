//! Scene Orchestration
//!
//! A [`SceneInstance`] owns the live mapping from layout names to layout
//! instances and their device outputs. It is constructed explicitly by the
//! host's composition root with a runtime handle and paint settings; there
//! is no ambient singleton.
//!
//! Reconciliation is by name: patching a scene definition updates matching
//! instances in place (pose and device changes keep the pixel buffer and,
//! where possible, the sockets), tears down instances whose definition
//! disappeared, and spawns instances for new names.
//!
//! Load and patch are all-or-nothing: the incoming definition is validated
//! and every new instance is built before any live layout is touched, so a
//! bad definition never installs a partial scene.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use glam::Vec3;

use glowlink_core::color::Rgb;
use glowlink_core::layout::LayoutInstance;
use glowlink_core::scene::{DeviceDefinition, LayoutDefinition, Pose, SceneDefinition};
use glowlink_core::settings::PaintSettings;

use crate::device::{DeviceConfig, DeviceOutput};
use crate::sacn::MAX_UNIVERSE;
use crate::universe::MAX_CHANNELS_PER_UNIVERSE;
use crate::{ControlError, Result};

/// One live layout and the device outputs consuming its channels
struct SceneLayout {
    definition: LayoutDefinition,
    instance: LayoutInstance,
    devices: Vec<DeviceOutput>,
}

impl SceneLayout {
    /// True if `other` can be applied to this instance without rebuilding
    /// its surface and channel tables.
    fn geometry_matches(&self, other: &LayoutDefinition) -> bool {
        match (&self.definition, other) {
            (LayoutDefinition::Grid(a), LayoutDefinition::Grid(b)) => {
                a.layout == b.layout
                    && a.physical_width_meters == b.physical_width_meters
                    && a.physical_height_meters == b.physical_height_meters
                    && a.horizontal_panel_pixel_count == b.horizontal_panel_pixel_count
                    && a.vertical_panel_pixel_count == b.vertical_panel_pixel_count
                    && a.devices.len() == b.devices.len()
                    && a.devices
                        .iter()
                        .zip(&b.devices)
                        .all(|(x, y)| x.led_count == y.led_count)
            }
            (LayoutDefinition::Lantern(a), LayoutDefinition::Lantern(b)) => {
                a.physical_radius_meters == b.physical_radius_meters
                    && a.physical_height_meters == b.physical_height_meters
                    && a.horizontal_panel_pixel_count == b.horizontal_panel_pixel_count
                    && a.vertical_panel_pixel_count == b.vertical_panel_pixel_count
                    && a.panel_count == b.panel_count
            }
            _ => false,
        }
    }

    /// Device bindings for a definition: each device paired with the number
    /// of layout channels it consumes. Grid devices consume their own LED
    /// counts; a lantern's single device carries the layout's full channel
    /// stream regardless of its configured LED count.
    fn device_bindings(definition: &LayoutDefinition) -> Vec<(&DeviceDefinition, usize)> {
        match definition {
            LayoutDefinition::Grid(def) => def
                .devices
                .iter()
                .map(|d| (d, d.channel_count()))
                .collect(),
            LayoutDefinition::Lantern(def) => vec![(&def.device, definition.channel_count())],
        }
    }

    fn teardown(&mut self) {
        for device in &mut self.devices {
            device.stop();
        }
    }
}

/// The live scene: named layout instances plus their broadcasters
pub struct SceneInstance {
    runtime: tokio::runtime::Handle,
    settings: PaintSettings,
    scene_pose: Pose,
    layouts: HashMap<String, SceneLayout>,
}

impl SceneInstance {
    /// Create an empty scene bound to a runtime for its broadcaster tasks
    pub fn new(runtime: tokio::runtime::Handle, settings: PaintSettings) -> Self {
        Self {
            runtime,
            settings,
            scene_pose: Pose::identity(),
            layouts: HashMap::new(),
        }
    }

    /// Replace the live scene with `definition`, instantiating every layout
    /// and starting its broadcasters.
    ///
    /// A definition that fails to validate or instantiate is rejected
    /// before the current scene is torn down.
    pub fn load(&mut self, definition: &SceneDefinition) -> Result<()> {
        definition.validate()?;
        let scene_pose = definition.scene_transform.pose();

        // Build everything before touching the live scene
        let mut built = Vec::new();
        for layout_definition in definition.layout_definitions() {
            check_device_bindings(&layout_definition)?;
            let instance = LayoutInstance::from_definition(&layout_definition, &scene_pose)?;
            built.push((layout_definition, instance));
        }

        self.unload();
        self.scene_pose = scene_pose;
        for (layout_definition, instance) in built {
            self.install_layout(layout_definition, instance)?;
        }
        Ok(())
    }

    /// Reconcile the live scene against an updated definition.
    ///
    /// Unchanged and patched layouts keep their pixel buffers; a layout
    /// whose geometry changed is rebuilt; names that disappeared are torn
    /// down; new names are spawned. A definition that fails to validate or
    /// instantiate is rejected before any live layout changes.
    pub fn patch(&mut self, definition: &SceneDefinition) -> Result<()> {
        definition.validate()?;
        let scene_pose = definition.scene_transform.pose();

        // Phase one: classify every incoming definition and build every
        // instance the patch will need, touching no live state.
        let mut in_place = Vec::new();
        let mut rebuilt = Vec::new();
        for layout_definition in definition.layout_definitions() {
            check_device_bindings(&layout_definition)?;
            match self.layouts.get(layout_definition.name()) {
                Some(existing) if existing.geometry_matches(&layout_definition) => {
                    in_place.push(layout_definition);
                }
                _ => {
                    let instance =
                        LayoutInstance::from_definition(&layout_definition, &scene_pose)?;
                    rebuilt.push((layout_definition, instance));
                }
            }
        }

        // Phase two: apply. Nothing below can fail on configuration.
        self.scene_pose = scene_pose;

        let incoming: HashSet<&str> = in_place
            .iter()
            .map(|d| d.name())
            .chain(rebuilt.iter().map(|(d, _)| d.name()))
            .collect();
        let removed: Vec<String> = self
            .layouts
            .keys()
            .filter(|name| !incoming.contains(name.as_str()))
            .cloned()
            .collect();
        for name in removed {
            if let Some(mut layout) = self.layouts.remove(&name) {
                layout.teardown();
                tracing::info!("Despawned layout {}", name);
            }
        }

        for layout_definition in in_place {
            if let Some(existing) = self.layouts.get_mut(layout_definition.name()) {
                existing
                    .instance
                    .set_pose(&layout_definition, &self.scene_pose);

                let bindings = SceneLayout::device_bindings(&layout_definition);
                for (device, (device_definition, _)) in
                    existing.devices.iter_mut().zip(bindings)
                {
                    device.patch(device_definition);
                }
                existing.definition = layout_definition;
            }
        }

        for (layout_definition, instance) in rebuilt {
            if let Some(mut old) = self.layouts.remove(layout_definition.name()) {
                old.teardown();
                tracing::info!(
                    "Rebuilding layout {} (geometry changed)",
                    layout_definition.name()
                );
            }
            self.install_layout(layout_definition, instance)?;
        }

        Ok(())
    }

    /// Load a scene file and patch the live scene from it. Failures are
    /// logged and leave the live scene unchanged.
    pub fn reload_from_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        match SceneDefinition::load_file(path) {
            Ok(definition) => {
                if let Err(e) = self.patch(&definition) {
                    tracing::error!("Failed to patch scene from {}: {}", path.display(), e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to load/parse scene {}: {}", path.display(), e);
            }
        }
    }

    /// Tear down every layout and stop every broadcaster
    pub fn unload(&mut self) {
        for (name, mut layout) in self.layouts.drain() {
            layout.teardown();
            tracing::info!("Despawned layout {}", name);
        }
    }

    /// Render-domain entry point, called once per host frame: decay every
    /// surface and flush its colors into the shared channel buffers.
    pub fn tick(&mut self, delta_seconds: f32) {
        let decay_rate = self.settings.paint_decay_rate;
        for layout in self.layouts.values_mut() {
            layout.instance.tick(delta_seconds, decay_rate);
        }
    }

    /// Fan a world-space segment emitter out to every layout
    pub fn paint_segment(&mut self, world_start: Vec3, world_end: Vec3, color: Rgb) {
        let radius = self.settings.segment_paint_radius;
        for layout in self.layouts.values_mut() {
            layout
                .instance
                .paint_segment(world_start, world_end, radius, color);
        }
    }

    /// Fan a world-space box emitter out to every layout
    pub fn paint_box(
        &mut self,
        world_center: Vec3,
        world_x_axis: Vec3,
        world_y_axis: Vec3,
        world_z_axis: Vec3,
        color: Rgb,
    ) {
        let half_size = self.settings.box_paint_size;
        for layout in self.layouts.values_mut() {
            layout.instance.paint_box(
                world_center,
                world_x_axis,
                world_y_axis,
                world_z_axis,
                half_size,
                color,
            );
        }
    }

    /// Names of the live layouts
    pub fn layout_names(&self) -> Vec<String> {
        self.layouts.keys().cloned().collect()
    }

    /// Number of live layouts
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// True when no layouts are loaded
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Borrow a live layout instance by name
    pub fn layout(&self, name: &str) -> Option<&LayoutInstance> {
        self.layouts.get(name).map(|l| &l.instance)
    }

    /// Borrow a layout's device outputs by name
    pub fn devices(&self, name: &str) -> Option<&[DeviceOutput]> {
        self.layouts.get(name).map(|l| l.devices.as_slice())
    }

    /// Wire devices to a prebuilt instance and start broadcasting.
    ///
    /// Bindings were checked by `check_device_bindings`, so installation
    /// cannot half-apply.
    fn install_layout(
        &mut self,
        definition: LayoutDefinition,
        instance: LayoutInstance,
    ) -> Result<()> {
        let name = definition.name().to_string();
        let channels = instance.channels();

        // Devices consume successive channel ranges of the layout
        let mut devices = Vec::new();
        let mut channel_start = 0;
        for (device_definition, channel_count) in SceneLayout::device_bindings(&definition) {
            let mut device = DeviceOutput::new(
                DeviceConfig::from_definition(device_definition),
                channels.clone(),
                self.runtime.clone(),
            );
            device.append_layout_channels(channel_start, channel_count)?;
            device.start();
            channel_start += channel_count;
            devices.push(device);
        }

        tracing::info!("Spawned layout {}", name);
        self.layouts.insert(
            name,
            SceneLayout {
                definition,
                instance,
                devices,
            },
        );
        Ok(())
    }
}

/// Reject device bindings whose universe run falls outside the valid sACN
/// ID space, before any instance or socket exists.
fn check_device_bindings(definition: &LayoutDefinition) -> Result<()> {
    for (device, channel_count) in SceneLayout::device_bindings(definition) {
        if device.start_universe == 0 {
            return Err(ControlError::SceneError(format!(
                "device {}: universe 0 is not a valid sACN universe",
                device.device_ip
            )));
        }

        let needed = channel_count.div_ceil(MAX_CHANNELS_PER_UNIVERSE).max(1);
        let last = device.start_universe as usize + needed - 1;
        if last > MAX_UNIVERSE as usize {
            return Err(ControlError::SceneError(format!(
                "device {}: universes {}..{} exceed the sACN range (max {})",
                device.device_ip, device.start_universe, last, MAX_UNIVERSE
            )));
        }
    }
    Ok(())
}

impl Drop for SceneInstance {
    fn drop(&mut self) {
        // Devices shut down best-effort via their own Drop; unload() is the
        // orderly path.
        self.layouts.clear();
    }
}
