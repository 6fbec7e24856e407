// Library-level pipeline tests over in-memory sources

use shp2svg::error::{ConvertError, Result};
use shp2svg::filter::FilterSet;
use shp2svg::geometry::{MultiPart, Point, Shape, ShapeType};
use shp2svg::graph::{Canvas, Pixel, PrimitiveStyle};
use shp2svg::project::project_shapes;
use shp2svg::render::{render, Styling};
use shp2svg::scale::{extent, PixelMapper};
use shp2svg::select::select;
use shp2svg::source::memory::MemoryOpener;
use shp2svg::source::{AttributeValue, Field, Record, SourceInfo};

#[derive(Debug, Clone, PartialEq)]
enum Primitive {
    Circle(Pixel, u32),
    Polyline(Vec<Pixel>),
    Polygon(Vec<Pixel>),
}

#[derive(Default)]
struct Recorder {
    primitives: Vec<Primitive>,
    finished: bool,
}

impl Canvas for Recorder {
    fn circle(&mut self, center: Pixel, radius: u32, _: &PrimitiveStyle) -> Result<()> {
        self.primitives.push(Primitive::Circle(center, radius));
        Ok(())
    }

    fn polyline(&mut self, points: &[Pixel], _: &PrimitiveStyle) -> Result<()> {
        self.primitives.push(Primitive::Polyline(points.to_vec()));
        Ok(())
    }

    fn polygon(&mut self, points: &[Pixel], _: &PrimitiveStyle) -> Result<()> {
        self.primitives.push(Primitive::Polygon(points.to_vec()));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

const STYLING: Styling = Styling {
    point_divisor: 10.0,
    line_divisor: 100.0,
};

fn polygon_info() -> SourceInfo {
    SourceInfo {
        declared_fields: vec!["NAME".to_string(), "POP".to_string()],
        shape_type: ShapeType::Polygon,
    }
}

fn triangle(name: &str, pop: f64, origin: f64) -> Record {
    Record {
        fields: vec![
            Field::new("NAME", AttributeValue::Text(name.to_string())),
            Field::new("POP", AttributeValue::Number(pop)),
        ],
        shape: Shape::Polygon(
            MultiPart::from_parts(vec![vec![
                Point::new(origin, 0.0),
                Point::new(origin + 2.0, 0.0),
                Point::new(origin + 1.0, 2.0),
            ]])
            .unwrap(),
        ),
    }
}

/// Select, compute the extent and render onto a recorder
fn pipeline(
    opener: &MemoryOpener,
    paths: &[&str],
    filters: &[&str],
    scale: f64,
) -> Result<Recorder> {
    let filters = FilterSet::parse(filters)?;
    let selection = select(opener, paths, &filters)?;
    let mapper = PixelMapper::new(extent(&selection.shapes)?, scale);
    let mut canvas = Recorder::default();
    render(&mut canvas, &selection.shapes, &mapper, &STYLING)?;
    canvas.finish()?;
    Ok(canvas)
}

#[test]
fn test_two_sources_two_polygons_in_order() {
    let opener = MemoryOpener::new()
        .with_dataset("west.zip", polygon_info(), vec![triangle("West", 10.0, 0.0)])
        .with_dataset("east.zip", polygon_info(), vec![triangle("East", 20.0, 10.0)]);

    let canvas = pipeline(&opener, &["west.zip", "east.zip"], &[], 1.0).unwrap();
    assert!(canvas.finished);
    assert_eq!(
        canvas.primitives,
        vec![
            Primitive::Polygon(vec![(0, 1), (2, 1), (1, -1)]),
            Primitive::Polygon(vec![(10, 1), (12, 1), (11, -1)]),
        ]
    );
}

#[test]
fn test_filters_merge_across_expressions() {
    let opener = MemoryOpener::new().with_dataset(
        "all.zip",
        polygon_info(),
        vec![
            triangle("A", 1.0, 0.0),
            triangle("B", 2.0, 3.0),
            triangle("C", 3.0, 6.0),
        ],
    );

    let canvas = pipeline(&opener, &["all.zip"], &["NAME = A", "NAME = [C]"], 1.0).unwrap();
    assert_eq!(canvas.primitives.len(), 2);

    let canvas = pipeline(&opener, &["all.zip"], &["POP = 2"], 1.0).unwrap();
    assert_eq!(canvas.primitives.len(), 1);
}

#[test]
fn test_unknown_field_fails_without_any_match() {
    let opener =
        MemoryOpener::new().with_dataset("all.zip", polygon_info(), vec![triangle("A", 1.0, 0.0)]);
    let result = pipeline(&opener, &["all.zip"], &["COUNTRY = Nowhere"], 1.0);
    match result {
        Err(ConvertError::UnknownFilterField(name)) => assert_eq!(name, "COUNTRY"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected an unknown field error"),
    }
}

#[test]
fn test_single_point_zero_canvas() {
    let opener = MemoryOpener::new().with_dataset(
        "dot.zip",
        SourceInfo {
            declared_fields: vec![],
            shape_type: ShapeType::Point,
        },
        vec![Record {
            fields: vec![],
            shape: Shape::Point(Point::new(1.0, 1.0)),
        }],
    );

    let filters = FilterSet::default();
    let selection = select(&opener, &["dot.zip"], &filters).unwrap();
    let mapper = PixelMapper::new(extent(&selection.shapes).unwrap(), 10.0);
    assert_eq!(mapper.canvas_size(), (0, 0));

    let mut canvas = Recorder::default();
    render(&mut canvas, &selection.shapes, &mapper, &STYLING).unwrap();
    assert_eq!(canvas.primitives, vec![Primitive::Circle((0, -1), 1)]);
}

#[test]
fn test_projection_then_render() {
    let opener =
        MemoryOpener::new().with_dataset("all.zip", polygon_info(), vec![triangle("A", 1.0, 0.0)]);
    let filters = FilterSet::default();
    let mut shapes = select(&opener, &["all.zip"], &filters).unwrap().shapes;

    let double = |x: f64, y: f64| (x * 2.0, y * 2.0);
    project_shapes(&mut shapes, &double).unwrap();
    assert_eq!(extent(&shapes).unwrap().max(), Point::new(4.0, 4.0));

    let mapper = PixelMapper::new(extent(&shapes).unwrap(), 1.0);
    let mut canvas = Recorder::default();
    render(&mut canvas, &shapes, &mapper, &STYLING).unwrap();
    assert_eq!(
        canvas.primitives,
        vec![Primitive::Polygon(vec![(0, 3), (4, 3), (2, -1)])]
    );
}
