//! Overlap tests between interaction shapes and LED sample points
//!
//! All tests compare squared distances, no square roots on the hot path.

use glam::Vec3;

/// Test whether `point` lies within `radius` of the segment `p1..p2`.
///
/// Uses the closest-point-on-segment projection: when the projection
/// parameter falls before `p1` or after `p2` the corresponding endpoint is
/// tested instead.
pub fn point_within_radius_of_segment(p1: Vec3, p2: Vec3, radius: f32, point: Vec3) -> bool {
    let r_sqr = radius * radius;
    let v = p2 - p1;
    let w = point - p1;

    // Closest point is p1
    let c1 = w.dot(v);
    if c1 <= 0.0 {
        return point.distance_squared(p1) <= r_sqr;
    }

    // Closest point is p2
    let c2 = v.dot(v);
    if c2 <= c1 {
        return point.distance_squared(p2) <= r_sqr;
    }

    // Closest point along the segment
    let b = c1 / c2;
    let pb = p1 + v * b;
    point.distance_squared(pb) <= r_sqr
}

/// Test whether `point` lies inside the oriented box given by `center`, the
/// three orthonormal basis axes and per-axis half-extents.
pub fn point_within_oriented_box(
    center: Vec3,
    x_axis: Vec3,
    y_axis: Vec3,
    z_axis: Vec3,
    extents: Vec3,
    point: Vec3,
) -> bool {
    let offset = point - center;

    offset.dot(x_axis).abs() <= extents.x
        && offset.dot(y_axis).abs() <= extents.y
        && offset.dot(z_axis).abs() <= extents.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_midpoint_on_segment() {
        assert!(point_within_radius_of_segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            Vec3::new(0.0, 0.0, 1.0),
        ));
    }

    #[test]
    fn test_segment_point_outside_radius() {
        assert!(!point_within_radius_of_segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            Vec3::new(0.2, 0.0, 1.0),
        ));
    }

    #[test]
    fn test_segment_point_beyond_first_endpoint() {
        // Closest point is p1, distance 0.5 > 0.1
        assert!(!point_within_radius_of_segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            Vec3::new(0.0, 0.0, -0.5),
        ));
    }

    #[test]
    fn test_segment_point_beyond_second_endpoint() {
        assert!(!point_within_radius_of_segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            Vec3::new(0.0, 0.0, 2.5),
        ));
        assert!(point_within_radius_of_segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            Vec3::new(0.0, 0.0, 2.05),
        ));
    }

    #[test]
    fn test_segment_point_inside_radius() {
        assert!(point_within_radius_of_segment(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            0.1,
            Vec3::new(0.05, 0.0, 1.5),
        ));
    }

    #[test]
    fn test_oriented_box_axis_aligned() {
        let inside = point_within_oriented_box(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.5, -1.5, 2.9),
        );
        assert!(inside);

        let outside = point_within_oriented_box(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(1.1, 0.0, 0.0),
        );
        assert!(!outside);
    }

    #[test]
    fn test_oriented_box_rotated() {
        // Box rotated 45 degrees around Y: the point (1, 0, 0) projects onto
        // the rotated x-axis at ~0.707.
        let sqrt_half = std::f32::consts::FRAC_1_SQRT_2;
        let x_axis = Vec3::new(sqrt_half, 0.0, sqrt_half);
        let z_axis = Vec3::new(-sqrt_half, 0.0, sqrt_half);

        assert!(point_within_oriented_box(
            Vec3::ZERO,
            x_axis,
            Vec3::Y,
            z_axis,
            Vec3::splat(0.75),
            Vec3::new(1.0, 0.0, 0.0),
        ));
        assert!(!point_within_oriented_box(
            Vec3::ZERO,
            x_axis,
            Vec3::Y,
            z_axis,
            Vec3::splat(0.7),
            Vec3::new(1.0, 0.0, 0.0),
        ));
    }

    #[test]
    fn test_box_boundary_is_inclusive() {
        assert!(point_within_oriented_box(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::splat(1.0),
            Vec3::new(1.0, 1.0, 1.0),
        ));
    }
}
