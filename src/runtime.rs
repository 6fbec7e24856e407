// Runtime executor: selection, projection, extent, rendering, output

use crate::error::{ConvertError, Result};
use crate::filter::FilterSet;
use crate::geometry::Shape;
use crate::graph::draw_to_bytes;
use crate::project::{project_shapes, CrsProjector};
use crate::render::{render, Styling};
use crate::scale::{extent, PixelMapper};
use crate::select::select;
use crate::source::SourceOpener;
use crate::RenderOptions;
use std::path::PathBuf;

/// Everything one conversion needs
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub shapefiles: Vec<PathBuf>,
    pub destination: PathBuf,
    pub filters: Vec<String>,
    pub options: RenderOptions,
}

/// Encoded image plus its pixel size
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub width: u64,
    pub height: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub records_scanned: usize,
    pub shapes: usize,
    pub width: u64,
    pub height: u64,
}

/// Convert the requested shapefiles into one image at the destination
pub fn convert<O: SourceOpener>(request: &ConvertRequest, opener: &O) -> Result<ConversionReport> {
    // 1. Options and filters are validated before any source is opened
    request.options.validate()?;
    let filters = FilterSet::parse(&request.filters)?;

    // 2. Collect shapes from every source
    let selection = select(opener, &request.shapefiles, &filters)?;
    let mut shapes = selection.shapes;
    log::info!(
        "selected {} of {} records from {} source(s)",
        shapes.len(),
        selection.records_scanned,
        request.shapefiles.len()
    );

    // 3. Optional reprojection
    if let Some(crs) = &request.options.crs {
        let projector = CrsProjector::new(crs)?;
        project_shapes(&mut shapes, &projector)?;
        log::debug!("projected shapes into {}", projector.target_name());
    }

    // 4. Render into memory, then write the destination in one go
    let target = request.destination.display().to_string();
    let image = render_shapes(&shapes, &request.options, &target)?;
    std::fs::write(&request.destination, &image.bytes).map_err(|e| {
        ConvertError::DestinationWriteFailure {
            path: target.clone(),
            message: e.to_string(),
        }
    })?;
    log::info!(
        "wrote {}x{} image to {}",
        image.width,
        image.height,
        target
    );

    Ok(ConversionReport {
        records_scanned: selection.records_scanned,
        shapes: shapes.len(),
        width: image.width,
        height: image.height,
    })
}

/// Render already selected (and projected) shapes into encoded image bytes
pub fn render_shapes(
    shapes: &[Shape],
    options: &RenderOptions,
    target: &str,
) -> Result<RenderedImage> {
    let bbox = extent(shapes)?;
    let mapper = PixelMapper::new(bbox, options.scale);
    let (width, height) = mapper.canvas_size();
    log::debug!("extent {:?} -> canvas {}x{}", bbox, width, height);

    let styling = Styling {
        point_divisor: options.point_divisor,
        line_divisor: options.line_divisor,
    };
    let bytes = draw_to_bytes(&options.format, (width, height), target, |canvas| {
        render(canvas, shapes, &mapper, &styling)
    })?;

    Ok(RenderedImage {
        bytes,
        width,
        height,
    })
}
