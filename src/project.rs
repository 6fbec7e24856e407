// Coordinate reprojection applied across every shape variant

use crate::error::{ConvertError, Result};
use crate::geometry::{MultiPart, Point, Shape};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

/// Geographic longitude/latitude on WGS84, the CRS shapefiles are read in.
const SOURCE_CRS: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Forward transform of one coordinate pair.
pub trait Projector {
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

impl<F> Projector for F
where
    F: Fn(f64, f64) -> (f64, f64),
{
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self(x, y))
    }
}

/// Reproject every shape in place.
///
/// Polylines and polygons get both bounding box corners transformed on their
/// own, then every vertex. The box is not rebuilt from the projected vertices,
/// so under a non-affine projection it may no longer be tight.
pub fn project_shapes<P: Projector + ?Sized>(shapes: &mut [Shape], projector: &P) -> Result<()> {
    for shape in shapes.iter_mut() {
        match shape {
            Shape::Point(point) => project_point(projector, point)?,
            Shape::Polyline(line) => project_multipart(projector, line)?,
            Shape::Polygon(polygon) => project_multipart(projector, polygon)?,
        }
    }
    Ok(())
}

fn project_point<P: Projector + ?Sized>(projector: &P, point: &mut Point) -> Result<()> {
    let (x, y) = projector.forward(point.x, point.y)?;
    point.x = x;
    point.y = y;
    Ok(())
}

fn project_multipart<P: Projector + ?Sized>(projector: &P, shape: &mut MultiPart) -> Result<()> {
    let (min_x, min_y) = projector.forward(shape.bbox.min_x, shape.bbox.min_y)?;
    shape.bbox.min_x = min_x;
    shape.bbox.min_y = min_y;

    let (max_x, max_y) = projector.forward(shape.bbox.max_x, shape.bbox.max_y)?;
    shape.bbox.max_x = max_x;
    shape.bbox.max_y = max_y;

    for part in shape.parts.iter_mut() {
        for point in part.iter_mut() {
            project_point(projector, point)?;
        }
    }
    Ok(())
}

/// Projection from geographic WGS84 into a user supplied CRS.
pub struct CrsProjector {
    source: Proj,
    target: Proj,
    target_name: String,
}

impl CrsProjector {
    /// `target` is either `EPSG:<code>` or a proj string.
    pub fn new(target: &str) -> Result<Self> {
        let source = Proj::from_proj_string(SOURCE_CRS)
            .map_err(|e| ConvertError::ProjectionFailure(format!("source CRS: {}", e)))?;
        let target_proj = parse_crs(target)?;
        Ok(Self {
            source,
            target: target_proj,
            target_name: target.to_string(),
        })
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }
}

fn parse_crs(definition: &str) -> Result<Proj> {
    let trimmed = definition.trim();
    let parsed = match epsg_code(trimmed) {
        Some(code) => Proj::from_epsg_code(code),
        None => Proj::from_proj_string(trimmed),
    };
    parsed.map_err(|e| {
        ConvertError::ProjectionFailure(format!("unknown target CRS '{}': {}", definition, e))
    })
}

/// `EPSG:3857` (any case) -> 3857
fn epsg_code(definition: &str) -> Option<u16> {
    let (authority, code) = definition.split_once(':')?;
    if !authority.trim().eq_ignore_ascii_case("epsg") {
        return None;
    }
    code.trim().parse().ok()
}

impl Projector for CrsProjector {
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut point = (x.to_radians(), y.to_radians(), 0.0);
        transform(&self.source, &self.target, &mut point).map_err(|e| {
            ConvertError::ProjectionFailure(format!(
                "({}, {}) into '{}': {}",
                x, y, self.target_name, e
            ))
        })?;

        if self.target.is_latlong() {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn shift(x: f64, y: f64) -> (f64, f64) {
        (x * 2.0, y + 100.0)
    }

    #[test]
    fn test_project_point() {
        let mut shapes = vec![Shape::Point(Point::new(1.0, 2.0))];
        project_shapes(&mut shapes, &shift).unwrap();
        assert_eq!(shapes[0], Shape::Point(Point::new(2.0, 102.0)));
    }

    #[test]
    fn test_project_corners_and_vertices() {
        let line = MultiPart {
            bbox: BoundingBox::new(0.0, 0.0, 4.0, 3.0),
            parts: vec![
                vec![Point::new(0.0, 0.0), Point::new(4.0, 3.0)],
                vec![Point::new(1.0, 1.0)],
            ],
        };
        let mut shapes = vec![Shape::Polyline(line.clone()), Shape::Polygon(line)];
        project_shapes(&mut shapes, &shift).unwrap();

        for shape in &shapes {
            let projected = match shape {
                Shape::Polyline(m) | Shape::Polygon(m) => m,
                Shape::Point(_) => panic!("expected a multipart shape"),
            };
            assert_eq!(projected.bbox, BoundingBox::new(0.0, 100.0, 8.0, 103.0));
            assert_eq!(
                projected.parts,
                vec![
                    vec![Point::new(0.0, 100.0), Point::new(8.0, 103.0)],
                    vec![Point::new(2.0, 101.0)],
                ]
            );
        }
    }

    #[test]
    fn test_box_is_not_recomputed() {
        // Swapping axes flips which corner is smaller; corners are still mapped as-is.
        let swap = |x: f64, y: f64| (y, x);
        let mut shapes = vec![Shape::Polygon(MultiPart {
            bbox: BoundingBox::new(0.0, 5.0, 1.0, 6.0),
            parts: vec![vec![Point::new(0.5, 5.5)]],
        })];
        project_shapes(&mut shapes, &swap).unwrap();
        assert_eq!(shapes[0].bounding_box(), BoundingBox::new(5.0, 0.0, 6.0, 1.0));
    }

    #[test]
    fn test_epsg_code_parsing() {
        assert_eq!(epsg_code("EPSG:3857"), Some(3857));
        assert_eq!(epsg_code("epsg: 4326"), Some(4326));
        assert_eq!(epsg_code("+proj=merc"), None);
        assert_eq!(epsg_code("ESRI:102100"), None);
    }

    #[test]
    fn test_web_mercator_origin() {
        let projector = CrsProjector::new("EPSG:3857").unwrap();
        let (x, y) = projector.forward(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);

        let (x, _) = projector.forward(90.0, 0.0).unwrap();
        assert!((x - 10_018_754.171394622).abs() < 1.0);
    }

    #[test]
    fn test_geographic_target_keeps_degrees() {
        let projector = CrsProjector::new("EPSG:4326").unwrap();
        let (x, y) = projector.forward(12.5, 41.9).unwrap();
        assert!((x - 12.5).abs() < 1e-6);
        assert!((y - 41.9).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_crs() {
        assert!(matches!(
            CrsProjector::new("EPSG:1"),
            Err(ConvertError::ProjectionFailure(_))
        ));
    }
}
