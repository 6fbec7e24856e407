use crate::error::{ConvertError, Result};
use crate::geometry::{BoundingBox, Shape};
use crate::graph::Pixel;

/// Union of every shape's bounding box
pub fn extent(shapes: &[Shape]) -> Result<BoundingBox> {
    shapes
        .iter()
        .map(Shape::bounding_box)
        .reduce(|acc, b| acc.union(&b))
        .ok_or(ConvertError::EmptyExtent)
}

/// Maps geometry coordinates into pixel space for a fixed extent and scale.
///
/// Pixel y grows downwards, geometry y grows upwards. Every scaled coordinate
/// is rounded on its own before subtracting so that pixel placement agrees
/// with the canvas size. Pixels are 64-bit: projected metres at the default
/// scale easily pass `i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMapper {
    pub bbox: BoundingBox,
    pub scale: f64,
}

impl PixelMapper {
    pub fn new(bbox: BoundingBox, scale: f64) -> Self {
        Self { bbox, scale }
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> Pixel {
        let s = self.scale;
        let b = &self.bbox;
        let px = round((x - b.min_x) * s);
        let py = round(b.max_y * s)
            .saturating_sub(round(b.min_y * s))
            .saturating_sub(round((y - b.min_y) * s))
            .saturating_sub(1);
        (px, py)
    }

    /// (width, height) of the canvas covering the extent
    pub fn canvas_size(&self) -> (u64, u64) {
        let s = self.scale;
        let b = &self.bbox;
        let width = round(b.max_x * s).saturating_sub(round(b.min_x * s));
        let height = round(b.max_y * s).saturating_sub(round(b.min_y * s));
        (width.max(0) as u64, height.max(0) as u64)
    }
}

// Half away from zero; out of range values saturate
fn round(v: f64) -> i64 {
    v.round() as i64
}
