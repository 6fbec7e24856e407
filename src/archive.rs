// Zipped shapefile record source
//
// The archive must contain a `.shp` geometry file and a `.dbf` attribute table.
// When several candidates exist the one named after the archive wins.

use crate::error::{ConvertError, Result};
use crate::geometry::{BoundingBox, MultiPart, Point, Shape, ShapeType};
use crate::source::{AttributeValue, Field, Record, RecordSource, SourceInfo, SourceOpener};
use shapefile::dbase::{self, FieldValue};
use shapefile::ShapeReader;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

type Buffer = Cursor<Vec<u8>>;

/// Opens `.zip` shapefile archives from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipShapefileOpener;

impl SourceOpener for ZipShapefileOpener {
    type Source = ZipShapefile;

    fn open(&self, path: &Path) -> Result<ZipShapefile> {
        ZipShapefile::open(path)
    }
}

pub struct ZipShapefile {
    path: String,
    info: SourceInfo,
    // Readers waiting for the first scan
    scanner: Option<(ShapeReader<Buffer>, dbase::Reader<Buffer>)>,
    pending: std::vec::IntoIter<(shapefile::Shape, dbase::Record)>,
}

impl ZipShapefile {
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let open_failure = |message: String| ConvertError::SourceOpenFailure {
            path: display.clone(),
            message,
        };

        let file = File::open(path).map_err(|e| open_failure(e.to_string()))?;
        let mut archive = ZipArchive::new(file).map_err(|e| open_failure(e.to_string()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let shp = read_entry(&mut archive, &stem, "shp")
            .map_err(open_failure)?
            .ok_or_else(|| open_failure("archive has no .shp entry".to_string()))?;
        let dbf = read_entry(&mut archive, &stem, "dbf")
            .map_err(open_failure)?
            .ok_or_else(|| open_failure("archive has no .dbf entry".to_string()))?;

        let shapes = ShapeReader::new(Cursor::new(shp))
            .map_err(|e| open_failure(format!("invalid .shp: {}", e)))?;
        let table = dbase::Reader::new(Cursor::new(dbf))
            .map_err(|e| open_failure(format!("invalid .dbf: {}", e)))?;

        let shape_type = match shapes.header().shape_type {
            shapefile::ShapeType::Point => ShapeType::Point,
            shapefile::ShapeType::Polyline => ShapeType::Polyline,
            shapefile::ShapeType::Polygon => ShapeType::Polygon,
            other => {
                return Err(ConvertError::UnsupportedShapeType {
                    path: display,
                    shape_type: format!("{:?}", other),
                })
            }
        };

        let declared_fields = table
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .filter(|name| name != "DeletionFlag")
            .collect();

        log::debug!("{}: opened {} shapefile", display, shape_type);

        Ok(Self {
            path: display,
            info: SourceInfo {
                declared_fields,
                shape_type,
            },
            scanner: Some((shapes, table)),
            pending: Vec::new().into_iter(),
        })
    }

    /// Decode all shapes and attribute rows, pairing them by position
    fn scan(
        &mut self,
        shapes: ShapeReader<Buffer>,
        mut table: dbase::Reader<Buffer>,
    ) -> Result<()> {
        let read_failure = |message: String| ConvertError::SourceReadFailure {
            path: self.path.clone(),
            message,
        };

        let shapes = shapes.read().map_err(|e| read_failure(e.to_string()))?;
        let records = table
            .iter_records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| read_failure(e.to_string()))?;

        if shapes.len() != records.len() {
            return Err(read_failure(format!(
                "{} shapes but {} attribute rows",
                shapes.len(),
                records.len()
            )));
        }

        self.pending = shapes.into_iter().zip(records).collect::<Vec<_>>().into_iter();
        Ok(())
    }

    fn fields_of(&self, record: &dbase::Record) -> Vec<Field> {
        self.info
            .declared_fields
            .iter()
            .map(|name| {
                let value = record.get(name).map(attribute).unwrap_or(AttributeValue::Null);
                Field::new(name.clone(), value)
            })
            .collect()
    }
}

impl RecordSource for ZipShapefile {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        if let Some((shapes, table)) = self.scanner.take() {
            self.scan(shapes, table)?;
        }

        while let Some((shape, record)) = self.pending.next() {
            match convert_shape(shape, &self.path)? {
                Some(shape) => {
                    return Ok(Some(Record {
                        fields: self.fields_of(&record),
                        shape,
                    }))
                }
                None => log::warn!("{}: skipping record without geometry", self.path),
            }
        }
        Ok(None)
    }

    fn close(self) -> Result<()> {
        log::debug!("{}: closed", self.path);
        Ok(())
    }
}

/// Bytes of the entry with the given extension, preferring `<stem>.<ext>`
fn read_entry(
    archive: &mut ZipArchive<File>,
    stem: &str,
    extension: &str,
) -> std::result::Result<Option<Vec<u8>>, String> {
    let mut fallback = None;
    for index in 0..archive.len() {
        let (matches_ext, named_after_archive) = {
            let entry = archive.by_index(index).map_err(|e| e.to_string())?;
            if entry.is_dir() || entry.name().starts_with("__MACOSX") {
                continue;
            }
            let name = Path::new(entry.name());
            let matches_ext = name
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            let named = name
                .file_stem()
                .map(|s| s.to_string_lossy() == stem)
                .unwrap_or(false);
            (matches_ext, named)
        };
        if !matches_ext {
            continue;
        }
        if named_after_archive {
            return read_index(archive, index).map(Some);
        }
        if fallback.is_none() {
            fallback = Some(index);
        }
    }

    match fallback {
        Some(index) => read_index(archive, index).map(Some),
        None => Ok(None),
    }
}

fn read_index(
    archive: &mut ZipArchive<File>,
    index: usize,
) -> std::result::Result<Vec<u8>, String> {
    let mut entry = archive.by_index(index).map_err(|e| e.to_string())?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
    Ok(bytes)
}

fn convert_shape(shape: shapefile::Shape, path: &str) -> Result<Option<Shape>> {
    let shape = match shape {
        shapefile::Shape::NullShape => return Ok(None),
        shapefile::Shape::Point(p) => Shape::Point(Point::new(p.x, p.y)),
        shapefile::Shape::Polyline(line) => {
            let bbox = line.bbox();
            Shape::Polyline(MultiPart {
                bbox: BoundingBox::new(bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y),
                parts: line.parts().iter().map(|part| convert_points(part)).collect(),
            })
        }
        shapefile::Shape::Polygon(polygon) => {
            let bbox = polygon.bbox();
            Shape::Polygon(MultiPart {
                bbox: BoundingBox::new(bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y),
                parts: polygon
                    .rings()
                    .iter()
                    .map(|ring| convert_points(ring.points()))
                    .collect(),
            })
        }
        other => {
            return Err(ConvertError::UnsupportedShapeType {
                path: path.to_string(),
                shape_type: format!("{:?}", other.shapetype()),
            })
        }
    };
    Ok(Some(shape))
}

fn convert_points(points: &[shapefile::Point]) -> Vec<Point> {
    points.iter().map(|p| Point::new(p.x, p.y)).collect()
}

fn attribute(value: &FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::Text(s.trim_end().to_string()),
        FieldValue::Memo(s) => AttributeValue::Text(s.clone()),
        FieldValue::Numeric(Some(n)) => AttributeValue::Number(*n),
        FieldValue::Float(Some(f)) => AttributeValue::Number(*f as f64),
        FieldValue::Integer(i) => AttributeValue::Number(*i as f64),
        FieldValue::Double(d) | FieldValue::Currency(d) => AttributeValue::Number(*d),
        FieldValue::Logical(Some(b)) => AttributeValue::Logical(*b),
        // Dates and empty values never match a filter
        _ => AttributeValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    /// Point shapefile (.shp) bytes
    fn point_shp(shape_type: i32, points: &[(f64, f64)]) -> Vec<u8> {
        let record_len = 8 + 20;
        let file_len = 100 + record_len * points.len();

        let mut out = Vec::new();
        out.extend_from_slice(&9994i32.to_be_bytes());
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(&((file_len / 2) as i32).to_be_bytes());
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&shape_type.to_le_bytes());

        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        for v in [min_x, min_y, max_x, max_y, 0.0, 0.0, 0.0, 0.0] {
            out.extend_from_slice(&v.to_le_bytes());
        }

        for (i, (x, y)) in points.iter().enumerate() {
            out.extend_from_slice(&((i + 1) as i32).to_be_bytes());
            out.extend_from_slice(&10i32.to_be_bytes());
            out.extend_from_slice(&1i32.to_le_bytes());
            out.extend_from_slice(&x.to_le_bytes());
            out.extend_from_slice(&y.to_le_bytes());
        }
        out
    }

    /// dBase III table with a single character column
    fn name_dbf(column: &str, values: &[&str]) -> Vec<u8> {
        const WIDTH: usize = 16;
        let mut out = vec![0x03, 124, 1, 1];
        out.extend_from_slice(&(values.len() as u32).to_le_bytes());
        out.extend_from_slice(&((32 + 32 + 1) as u16).to_le_bytes());
        out.extend_from_slice(&((1 + WIDTH) as u16).to_le_bytes());
        out.extend_from_slice(&[0u8; 20]);

        let mut name = [0u8; 11];
        name[..column.len()].copy_from_slice(column.as_bytes());
        out.extend_from_slice(&name);
        out.push(b'C');
        out.extend_from_slice(&[0u8; 4]);
        out.push(WIDTH as u8);
        out.push(0);
        out.extend_from_slice(&[0u8; 14]);
        out.push(0x0D);

        for value in values {
            out.push(b' ');
            out.extend_from_slice(format!("{:<width$}", value, width = WIDTH).as_bytes());
        }
        out.push(0x1A);
        out
    }

    fn write_zip(file_name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shp2svg-archive-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);

        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        for (name, bytes) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_reads_points_and_attributes() {
        let path = write_zip(
            "cities.zip",
            &[
                ("cities.shp", point_shp(1, &[(2.35, 48.85), (13.4, 52.5)])),
                ("cities.dbf", name_dbf("NAME", &["Paris", "Berlin"])),
            ],
        );

        let mut source = ZipShapefileOpener.open(&path).unwrap();
        assert_eq!(source.info().shape_type, ShapeType::Point);
        assert_eq!(source.info().declared_fields, vec!["NAME"]);

        let first = source.next_record().unwrap().unwrap();
        assert_eq!(first.shape, Shape::Point(Point::new(2.35, 48.85)));
        assert!(first.fields[0].matches("Paris"));

        let second = source.next_record().unwrap().unwrap();
        assert!(second.fields[0].matches("Berlin"));

        assert!(source.next_record().unwrap().is_none());
        source.close().unwrap();
    }

    #[test]
    fn test_unsupported_shape_type() {
        // 8 = MultiPoint
        let path = write_zip(
            "multi.zip",
            &[
                ("multi.shp", point_shp(8, &[])),
                ("multi.dbf", name_dbf("NAME", &[])),
            ],
        );
        let result = ZipShapefileOpener.open(&path);
        assert!(matches!(result, Err(ConvertError::UnsupportedShapeType { .. })));
    }

    #[test]
    fn test_missing_table() {
        let path = write_zip("lonely.zip", &[("lonely.shp", point_shp(1, &[(0.0, 0.0)]))]);
        let result = ZipShapefileOpener.open(&path);
        assert!(matches!(result, Err(ConvertError::SourceOpenFailure { .. })));
    }

    #[test]
    fn test_missing_archive() {
        let result = ZipShapefileOpener.open(Path::new("/definitely/not/here.zip"));
        match result {
            Err(ConvertError::SourceOpenFailure { path, .. }) => assert!(path.contains("here.zip")),
            _ => panic!("expected an open failure"),
        }
    }
}
