//! Frame-relative 3-D point to surface coordinates.
//!
//! The rotation step is an approximation, not a rotation-matrix composition. Other clients of the
//! same stream server use the identical formula, so labels must land on the same pixels.

use crate::foundation::core::{Pose, Vec3};

/// A projected point: surface pixel coordinates plus the transformed depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Project `point`, expressed in the frame described by `pose`, onto a
/// `surface_width`x`surface_height` surface.
///
/// Pure: no hidden state, identical inputs give identical outputs (NaN inputs propagate).
pub fn project(pose: &Pose, point: Vec3, surface_width: f64, surface_height: f64) -> Projected {
    let x = point.x + pose.translation.x;
    let y = point.y + pose.translation.y;
    let z = point.z + pose.translation.z;

    // rotation.x does not take part in the approximation.
    let (ry, rz) = (pose.rotation.y, pose.rotation.z);
    let x = x + x * rz.cos() * ry.sin();
    let y = y + y * rz.sin();
    let z = z + z * rz.cos() * ry.cos();

    Projected {
        x: (1.0 + x) * (surface_width / 2.0),
        y: surface_height * (1.0 - y),
        depth: z,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/projection.rs"]
mod tests;
