//! Pixel Surface - Per-Sample Color State for One Physical Fixture
//!
//! A surface is a dense set of sample points mapped onto a physical shape
//! (planar grid or partial cylinder). Colors decay toward black every frame
//! and are raised by paint operations driven by interaction events. The
//! paint pass has no cross-sample dependency and runs data-parallel.

use glam::Vec3;
use rayon::prelude::*;

use crate::color::Rgb;
use crate::math;
use crate::{CoreError, Result};

/// Per-sample positions and colors for one layout instance.
///
/// Invariant: `positions.len() == colors.len() == horizontal * vertical`,
/// row-major, index i maps 1:1 to a physical LED sample.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    positions: Vec<Vec3>,
    colors: Vec<Rgb>,
    horizontal: usize,
    vertical: usize,
}

impl PixelSurface {
    /// Build a planar grid of samples in the local Y-Z plane at x = 0,
    /// normal along local +X, evenly spaced over the physical dimensions.
    ///
    /// Fails if either pixel count is below 2 (a grid needs at least one
    /// span per axis to space samples).
    pub fn planar_grid(
        width_meters: f32,
        height_meters: f32,
        horizontal: usize,
        vertical: usize,
    ) -> Result<Self> {
        if horizontal < 2 || vertical < 2 {
            return Err(CoreError::InvalidLayout(format!(
                "grid pixel counts must be at least 2x2, got {}x{}",
                horizontal, vertical
            )));
        }

        let mut positions = Vec::with_capacity(horizontal * vertical);
        for j in 0..vertical {
            let v = j as f32 / (vertical - 1) as f32;
            let y = (0.5 - v) * height_meters;

            for i in 0..horizontal {
                let u = i as f32 / (horizontal - 1) as f32;
                let z = (u - 0.5) * width_meters;

                positions.push(Vec3::new(0.0, y, z));
            }
        }

        Ok(Self::from_positions(positions, horizontal, vertical))
    }

    /// Build samples on a partial cylinder around the local Y axis.
    ///
    /// The arc length is half the circumference (span of pi radians), with
    /// the first column on the +X side sweeping toward +Z. Rows are spread
    /// evenly over the full physical height.
    pub fn cylinder(
        radius_meters: f32,
        height_meters: f32,
        per_row: usize,
        rows: usize,
    ) -> Result<Self> {
        if per_row < 2 || rows < 2 {
            return Err(CoreError::InvalidLayout(format!(
                "cylinder pixel counts must be at least 2x2, got {}x{}",
                per_row, rows
            )));
        }
        if radius_meters <= 0.0 {
            return Err(CoreError::InvalidLayout(format!(
                "cylinder radius must be positive, got {}",
                radius_meters
            )));
        }

        // ArcLength = Radius * AngularSpan; half circumference by convention
        let arc_length = std::f32::consts::PI * radius_meters;
        let angular_span = arc_length / radius_meters;

        let mut positions = Vec::with_capacity(per_row * rows);
        for j in 0..rows {
            let v = j as f32 / (rows - 1) as f32;
            let y = (v - 0.5) * height_meters;

            for i in 0..per_row {
                let u = i as f32 / (per_row - 1) as f32;
                let theta = (-0.5 + u) * angular_span;
                let x = radius_meters * theta.cos();
                let z = radius_meters * theta.sin();

                positions.push(Vec3::new(x, y, z));
            }
        }

        Ok(Self::from_positions(positions, per_row, rows))
    }

    fn from_positions(positions: Vec<Vec3>, horizontal: usize, vertical: usize) -> Self {
        let colors = vec![Rgb::BLACK; positions.len()];
        Self {
            positions,
            colors,
            horizontal,
            vertical,
        }
    }

    /// Samples per row
    pub fn horizontal(&self) -> usize {
        self.horizontal
    }

    /// Number of rows
    pub fn vertical(&self) -> usize {
        self.vertical
    }

    /// Total sample count
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// True if the surface has no samples
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Local-space sample positions, row-major
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Current sample colors, row-major
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Fade every sample toward black by `clamp01(rate * dt)`.
    ///
    /// Runs once per output frame, before any paints of that frame.
    /// A zero delta is a no-op.
    pub fn decay(&mut self, delta_seconds: f32, rate_per_second: f32) {
        let t = (rate_per_second * delta_seconds).clamp(0.0, 1.0);
        if t == 0.0 {
            return;
        }

        for color in &mut self.colors {
            *color = color.lerp_toward(Rgb::BLACK, t);
        }
    }

    /// Raise every sample within `radius` of the segment to the per-channel
    /// maximum of its current color and `color`.
    pub fn paint_segment(&mut self, start: Vec3, end: Vec3, radius: f32, color: Rgb) {
        let positions = &self.positions;
        self.colors
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, sample)| {
                if math::point_within_radius_of_segment(start, end, radius, positions[index]) {
                    *sample = sample.max_blend(color);
                }
            });
    }

    /// Raise every sample inside the oriented box to the per-channel maximum
    /// of its current color and `color`.
    pub fn paint_box(
        &mut self,
        center: Vec3,
        x_axis: Vec3,
        y_axis: Vec3,
        z_axis: Vec3,
        extents: Vec3,
        color: Rgb,
    ) {
        let positions = &self.positions;
        self.colors
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, sample)| {
                if math::point_within_oriented_box(
                    center,
                    x_axis,
                    y_axis,
                    z_axis,
                    extents,
                    positions[index],
                ) {
                    *sample = sample.max_blend(color);
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_grid() -> PixelSurface {
        // 1m x 1m, 5x5 samples: spacing 0.25m in both local axes
        PixelSurface::planar_grid(1.0, 1.0, 5, 5).unwrap()
    }

    #[test]
    fn test_grid_rejects_degenerate_pixel_counts() {
        assert!(PixelSurface::planar_grid(1.0, 1.0, 1, 5).is_err());
        assert!(PixelSurface::planar_grid(1.0, 1.0, 5, 0).is_err());
        assert!(PixelSurface::planar_grid(1.0, 1.0, 2, 2).is_ok());
    }

    #[test]
    fn test_grid_sample_positions() {
        let surface = test_grid();
        assert_eq!(surface.len(), 25);

        // First sample: top row (v=0 -> y=+0.5), left column (u=0 -> z=-0.5)
        assert_eq!(surface.positions()[0], Vec3::new(0.0, 0.5, -0.5));
        // Last sample: bottom right
        assert_eq!(surface.positions()[24], Vec3::new(0.0, -0.5, 0.5));
        // Center sample
        assert_eq!(surface.positions()[12], Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_cylinder_sample_positions() {
        let r = 2.0;
        let surface = PixelSurface::cylinder(r, 1.0, 3, 2).unwrap();
        assert_eq!(surface.len(), 6);

        // Half-circle span: first column at -pi/2 (x=0, z=-r), middle at 0
        // (x=r, z=0), last at +pi/2 (x=0, z=+r). Bottom row is y=-0.5.
        let p0 = surface.positions()[0];
        assert!(p0.x.abs() < 1e-5 && (p0.z + r).abs() < 1e-5);
        assert!((p0.y + 0.5).abs() < 1e-5);

        let p1 = surface.positions()[1];
        assert!((p1.x - r).abs() < 1e-5 && p1.z.abs() < 1e-5);

        let p2 = surface.positions()[2];
        assert!(p2.x.abs() < 1e-5 && (p2.z - r).abs() < 1e-5);
    }

    #[test]
    fn test_cylinder_rejects_bad_dimensions() {
        assert!(PixelSurface::cylinder(0.0, 1.0, 3, 3).is_err());
        assert!(PixelSurface::cylinder(-1.0, 1.0, 3, 3).is_err());
        assert!(PixelSurface::cylinder(1.0, 1.0, 1, 3).is_err());
    }

    #[test]
    fn test_decay_zero_delta_is_noop() {
        let mut surface = test_grid();
        surface.paint_segment(Vec3::new(0.0, 0.6, -0.6), Vec3::new(0.0, -0.6, 0.6), 2.0, Rgb::WHITE);
        let before = surface.colors().to_vec();

        surface.decay(0.0, 2.0);
        assert_eq!(surface.colors(), &before[..]);
    }

    #[test]
    fn test_decay_reaches_black() {
        let mut surface = test_grid();
        surface.paint_segment(Vec3::new(0.0, 0.6, -0.6), Vec3::new(0.0, -0.6, 0.6), 2.0, Rgb::WHITE);
        assert!(surface.colors().iter().any(|c| !c.is_black()));

        for _ in 0..300 {
            surface.decay(1.0 / 30.0, 2.0);
        }
        assert!(surface.colors().iter().all(|c| c.is_black()));
    }

    #[test]
    fn test_decay_clamps_large_steps() {
        let mut surface = test_grid();
        surface.paint_box(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, Vec3::splat(10.0), Rgb::WHITE);

        // rate * dt > 1 clamps to a full fade in one step
        surface.decay(3.0, 2.0);
        assert!(surface.colors().iter().all(|c| c.is_black()));
    }

    #[test]
    fn test_paint_segment_hits_only_nearby_samples() {
        let mut surface = test_grid();
        let color = Rgb::new(200, 10, 30);

        // Vertical segment through the center column (z = 0)
        surface.paint_segment(
            Vec3::new(0.0, 0.6, 0.0),
            Vec3::new(0.0, -0.6, 0.0),
            0.1,
            color,
        );

        for (index, sample) in surface.colors().iter().enumerate() {
            let col = index % 5;
            if col == 2 {
                assert_eq!(*sample, color, "center column sample {} not painted", index);
            } else {
                assert!(sample.is_black(), "sample {} should be untouched", index);
            }
        }
    }

    #[test]
    fn test_paint_never_decreases_channels() {
        let mut surface = test_grid();
        surface.paint_segment(
            Vec3::new(0.0, 0.6, 0.0),
            Vec3::new(0.0, -0.6, 0.0),
            0.1,
            Rgb::new(200, 100, 50),
        );
        let before = surface.colors().to_vec();

        // Overlapping paint with dimmer channels must not dim anything
        surface.paint_segment(
            Vec3::new(0.0, 0.6, 0.0),
            Vec3::new(0.0, -0.6, 0.0),
            0.1,
            Rgb::new(10, 150, 25),
        );

        for (prev, now) in before.iter().zip(surface.colors()) {
            assert!(now.r >= prev.r && now.g >= prev.g && now.b >= prev.b);
        }
        // And the brighter incoming green won
        assert_eq!(surface.colors()[2].g, 150);
    }

    #[test]
    fn test_paint_box_containment() {
        let mut surface = test_grid();
        let color = Rgb::new(0, 255, 0);

        // Small box around the center sample only
        surface.paint_box(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::splat(0.1),
            color,
        );

        for (index, sample) in surface.colors().iter().enumerate() {
            if index == 12 {
                assert_eq!(*sample, color);
            } else {
                assert!(sample.is_black());
            }
        }
    }
}
