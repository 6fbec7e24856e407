// Geometry model shared by every pipeline stage

/// A single coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box, `min_x <= max_x` and `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Zero-area box sitting on a single point.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// Smallest box covering the given points, `None` when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            let own = Self::at(*p);
            Some(match acc {
                Some(b) => b.union(&own),
                None => own,
            })
        })
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }
}

/// Ordered parts of a polyline or polygon record, each an ordered vertex list.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPart {
    pub bbox: BoundingBox,
    pub parts: Vec<Vec<Point>>,
}

impl MultiPart {
    /// Build from parts, deriving the box from the vertices.
    pub fn from_parts(parts: Vec<Vec<Point>>) -> Option<Self> {
        let bbox = BoundingBox::from_points(parts.iter().flatten())?;
        Some(Self { bbox, parts })
    }
}

/// Geometry of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    Polyline(MultiPart),
    Polygon(MultiPart),
}

impl Shape {
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Shape::Point(p) => BoundingBox::at(*p),
            Shape::Polyline(line) => line.bbox,
            Shape::Polygon(poly) => poly.bbox,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Point(_) => ShapeType::Point,
            Shape::Polyline(_) => ShapeType::Polyline,
            Shape::Polygon(_) => ShapeType::Polygon,
        }
    }
}

/// Geometry kinds a source may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Point,
    Polyline,
    Polygon,
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeType::Point => write!(f, "Point"),
            ShapeType::Polyline => write!(f, "Polyline"),
            ShapeType::Polygon => write!(f, "Polygon"),
        }
    }
}
