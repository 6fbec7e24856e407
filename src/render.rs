// Shape renderer: one drawing primitive per point or part

use crate::error::Result;
use crate::geometry::{MultiPart, Point, Shape};
use crate::graph::{Canvas, Fill, Pixel, PrimitiveStyle, Stroke};
use crate::scale::PixelMapper;
use plotters::style::{BLACK, RED, WHITE};

/// Divisors turning the scale factor into marker radius and stroke width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Styling {
    pub point_divisor: f64,
    pub line_divisor: f64,
}

impl Styling {
    /// Radius of point markers, never below one pixel
    pub fn point_radius(&self, scale: f64) -> u32 {
        (scale / self.point_divisor).max(1.0) as u32
    }

    /// Stroke width of lines and outlines, never below one pixel
    pub fn stroke_width(&self, scale: f64) -> u32 {
        (scale / self.line_divisor).max(1.0) as u32
    }

    fn point_style(&self) -> PrimitiveStyle {
        PrimitiveStyle {
            stroke: None,
            fill: Some(Fill {
                color: RED,
                opacity: 1.0,
            }),
        }
    }

    fn line_style(&self, scale: f64) -> PrimitiveStyle {
        PrimitiveStyle {
            stroke: Some(Stroke {
                color: BLACK,
                width: self.stroke_width(scale),
            }),
            fill: None,
        }
    }

    // Closed but visually unfilled
    fn polygon_style(&self, scale: f64) -> PrimitiveStyle {
        PrimitiveStyle {
            fill: Some(Fill {
                color: WHITE,
                opacity: 0.0,
            }),
            ..self.line_style(scale)
        }
    }
}

/// Draw every shape onto the canvas
pub fn render(
    canvas: &mut dyn Canvas,
    shapes: &[Shape],
    mapper: &PixelMapper,
    styling: &Styling,
) -> Result<()> {
    for shape in shapes {
        match shape {
            Shape::Point(point) => render_point(canvas, point, mapper, styling)?,
            Shape::Polyline(line) => render_polyline(canvas, line, mapper, styling)?,
            Shape::Polygon(polygon) => render_polygon(canvas, polygon, mapper, styling)?,
        }
    }
    Ok(())
}

fn render_point(
    canvas: &mut dyn Canvas,
    point: &Point,
    mapper: &PixelMapper,
    styling: &Styling,
) -> Result<()> {
    let center = mapper.to_pixel(point.x, point.y);
    canvas.circle(
        center,
        styling.point_radius(mapper.scale),
        &styling.point_style(),
    )
}

fn render_polyline(
    canvas: &mut dyn Canvas,
    line: &MultiPart,
    mapper: &PixelMapper,
    styling: &Styling,
) -> Result<()> {
    let style = styling.line_style(mapper.scale);
    for part in &line.parts {
        canvas.polyline(&map_part(part, mapper), &style)?;
    }
    Ok(())
}

// Rings are drawn independently, no hole subtraction
fn render_polygon(
    canvas: &mut dyn Canvas,
    polygon: &MultiPart,
    mapper: &PixelMapper,
    styling: &Styling,
) -> Result<()> {
    let style = styling.polygon_style(mapper.scale);
    for part in &polygon.parts {
        canvas.polygon(&map_part(part, mapper), &style)?;
    }
    Ok(())
}

fn map_part(part: &[Point], mapper: &PixelMapper) -> Vec<Pixel> {
    part.iter().map(|p| mapper.to_pixel(p.x, p.y)).collect()
}
