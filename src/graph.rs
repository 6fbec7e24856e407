// Drawing targets for the shape renderer
//
// SVG is written element by element through `svg`; PNG goes through a plotters
// bitmap backend and is encoded with `image`.

use crate::error::{ConvertError, Result};
use crate::OutputFormat;
use image::ImageEncoder;
use plotters::prelude::*;
use plotters_backend::{BackendCoord, DrawingBackend, DrawingErrorKind};
use svg::node::element::{Circle, Polygon, Polyline};
use svg::{Document, Node};

/// Pixel position, y growing downwards
pub type Pixel = (i64, i64);

/// Largest bitmap `draw_to_bytes` will allocate, in pixels.
pub const MAX_PNG_PIXELS: u64 = 1 << 26;

/// Stroke applied to outlines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: RGBColor,
    pub width: u32,
}

/// Interior fill, `opacity` in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: RGBColor,
    pub opacity: f64,
}

/// Styling of a single drawing primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveStyle {
    pub stroke: Option<Stroke>,
    pub fill: Option<Fill>,
}

/// Target of the shape renderer, already sized to the output extent.
pub trait Canvas {
    fn circle(&mut self, center: Pixel, radius: u32, style: &PrimitiveStyle) -> Result<()>;

    /// Open path through the points
    fn polyline(&mut self, points: &[Pixel], style: &PrimitiveStyle) -> Result<()>;

    /// Closed ring through the points
    fn polygon(&mut self, points: &[Pixel], style: &PrimitiveStyle) -> Result<()>;

    /// Flush everything drawn so far
    fn finish(&mut self) -> Result<()>;
}

/// SVG document with one element per primitive
pub struct SvgCanvas {
    document: Document,
}

impl SvgCanvas {
    pub fn new(size: (u64, u64)) -> Self {
        Self {
            document: Document::new()
                .set("width", size.0.to_string())
                .set("height", size.1.to_string()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.document.to_string().into_bytes()
    }
}

fn hex(color: &RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

fn points_attr(points: &[Pixel]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fill and stroke attributes shared by every element
macro_rules! styled {
    ($element:expr, $style:expr) => {{
        let mut element = $element;
        match &$style.fill {
            Some(fill) => {
                element = element.set("fill", hex(&fill.color));
                if fill.opacity < 1.0 {
                    element = element.set("fill-opacity", fill.opacity.to_string());
                }
            }
            None => element = element.set("fill", "none"),
        }
        if let Some(stroke) = &$style.stroke {
            element = element
                .set("stroke", hex(&stroke.color))
                .set("stroke-width", stroke.width.to_string());
        }
        element
    }};
}

impl Canvas for SvgCanvas {
    fn circle(&mut self, center: Pixel, radius: u32, style: &PrimitiveStyle) -> Result<()> {
        let circle = Circle::new()
            .set("cx", center.0.to_string())
            .set("cy", center.1.to_string())
            .set("r", radius.to_string());
        self.document.append(styled!(circle, style));
        Ok(())
    }

    fn polyline(&mut self, points: &[Pixel], style: &PrimitiveStyle) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let line = Polyline::new().set("points", points_attr(points));
        self.document.append(styled!(line, style));
        Ok(())
    }

    fn polygon(&mut self, points: &[Pixel], style: &PrimitiveStyle) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let polygon = Polygon::new().set("points", points_attr(points));
        self.document.append(styled!(polygon, style));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Canvas over any plotters backend
pub struct PlottersCanvas<DB: DrawingBackend> {
    backend: DB,
    target: String,
}

impl<DB: DrawingBackend> PlottersCanvas<DB> {
    /// `target` names the destination in error messages
    pub fn new(backend: DB, target: impl Into<String>) -> Self {
        Self {
            backend,
            target: target.into(),
        }
    }

    fn fail(&self, err: DrawingErrorKind<DB::ErrorType>) -> ConvertError {
        ConvertError::DestinationWriteFailure {
            path: self.target.clone(),
            message: err.to_string(),
        }
    }

    fn coord(&self, pixel: Pixel) -> Result<BackendCoord> {
        match (i32::try_from(pixel.0), i32::try_from(pixel.1)) {
            (Ok(x), Ok(y)) => Ok((x, y)),
            _ => Err(ConvertError::DestinationWriteFailure {
                path: self.target.clone(),
                message: format!("pixel ({}, {}) out of bitmap range", pixel.0, pixel.1),
            }),
        }
    }

    fn coords(&self, points: &[Pixel]) -> Result<Vec<BackendCoord>> {
        points.iter().map(|p| self.coord(*p)).collect()
    }
}

fn fill_style(fill: &Fill) -> ShapeStyle {
    ShapeStyle {
        color: fill.color.mix(fill.opacity),
        filled: true,
        stroke_width: 1,
    }
}

fn stroke_style(stroke: &Stroke) -> ShapeStyle {
    ShapeStyle {
        color: stroke.color.to_rgba(),
        filled: false,
        stroke_width: stroke.width,
    }
}

impl<DB: DrawingBackend> Canvas for PlottersCanvas<DB> {
    fn circle(&mut self, center: Pixel, radius: u32, style: &PrimitiveStyle) -> Result<()> {
        let center = self.coord(center)?;
        if let Some(fill) = &style.fill {
            self.backend
                .draw_circle(center, radius, &fill_style(fill), true)
                .map_err(|e| self.fail(e))?;
        }
        if let Some(stroke) = &style.stroke {
            self.backend
                .draw_circle(center, radius, &stroke_style(stroke), false)
                .map_err(|e| self.fail(e))?;
        }
        Ok(())
    }

    fn polyline(&mut self, points: &[Pixel], style: &PrimitiveStyle) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let points = self.coords(points)?;
        if let Some(stroke) = &style.stroke {
            self.backend
                .draw_path(points, &stroke_style(stroke))
                .map_err(|e| self.fail(e))?;
        }
        Ok(())
    }

    fn polygon(&mut self, points: &[Pixel], style: &PrimitiveStyle) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let mut ring = self.coords(points)?;
        if let Some(fill) = &style.fill {
            self.backend
                .fill_polygon(ring.iter().copied(), &fill_style(fill))
                .map_err(|e| self.fail(e))?;
        }
        if let Some(stroke) = &style.stroke {
            ring.push(ring[0]);
            self.backend
                .draw_path(ring, &stroke_style(stroke))
                .map_err(|e| self.fail(e))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.backend.present().map_err(|e| self.fail(e))
    }
}

/// Draw onto a fresh canvas of the given size and return the encoded image.
///
/// PNG output is at least 1x1 since zero-sized images cannot be encoded, and
/// at most `MAX_PNG_PIXELS`.
pub fn draw_to_bytes<F>(
    format: &OutputFormat,
    size: (u64, u64),
    target: &str,
    draw: F,
) -> Result<Vec<u8>>
where
    F: FnOnce(&mut dyn Canvas) -> Result<()>,
{
    match format {
        OutputFormat::Svg => {
            let mut canvas = SvgCanvas::new(size);
            draw(&mut canvas)?;
            canvas.finish()?;
            Ok(canvas.into_bytes())
        }
        OutputFormat::Png => {
            let (width, height) = bitmap_size(size, target)?;
            // White background
            let mut buffer = vec![255u8; (width as usize) * (height as usize) * 3];
            {
                let backend = BitMapBackend::with_buffer(&mut buffer, (width, height));
                let mut canvas = PlottersCanvas::new(backend, target);
                draw(&mut canvas)?;
                canvas.finish()?;
            }
            encode_png(&buffer, width, height, target)
        }
    }
}

fn bitmap_size(size: (u64, u64), target: &str) -> Result<(u32, u32)> {
    let (width, height) = (size.0.max(1), size.1.max(1));
    let within_limit = width
        .checked_mul(height)
        .map_or(false, |pixels| pixels <= MAX_PNG_PIXELS);
    match (within_limit, u32::try_from(width), u32::try_from(height)) {
        (true, Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ConvertError::DestinationWriteFailure {
            path: target.to_string(),
            message: format!(
                "PNG canvas {}x{} exceeds {} pixels, lower the scale factor",
                width, height, MAX_PNG_PIXELS
            ),
        }),
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32, target: &str) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(buffer, width, height, image::ColorType::Rgb8)
        .map_err(|e| ConvertError::DestinationWriteFailure {
            path: target.to_string(),
            message: format!("failed to encode PNG: {}", e),
        })?;
    Ok(png_bytes)
}
