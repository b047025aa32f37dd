use crate::foundation::error::{OverlayError, OverlayResult};
use serde::{Deserialize, Deserializer, Serialize};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// A point or vector in a frame's 3-D coordinate system.
///
/// Deserialization is lenient: a missing or non-numeric component becomes NaN rather than an
/// error, so a malformed pose degrades the projection instead of dropping the update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub x: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub y: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn nan() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Placement of a frame relative to its parent frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    #[serde(default = "Vec3::nan")]
    pub rotation: Vec3,
    #[serde(default = "Vec3::nan")]
    pub translation: Vec3,
}

impl Pose {
    /// No rotation, no translation. Used whenever a frame has no known pose yet.
    pub const IDENTITY: Self = Self {
        rotation: Vec3::ZERO,
        translation: Vec3::ZERO,
    };

    pub fn new(rotation: Vec3, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            rotation: Vec3::ZERO,
            translation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        if width == 0 || height == 0 {
            return Err(OverlayError::validation("canvas width/height must be > 0"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(OverlayError::validation(format!(
                "canvas {width}x{height} exceeds {max}x{max}",
                max = u16::MAX
            )));
        }
        Ok(Self { width, height })
    }

    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

fn nan() -> f64 {
    f64::NAN
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(v.as_f64().unwrap_or(f64::NAN))
}
