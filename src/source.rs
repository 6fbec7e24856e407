// Record source contracts
//
// The selector only sees these traits, so archives on disk and synthetic
// in-memory datasets are interchangeable.

use crate::error::Result;
use crate::geometry::{Shape, ShapeType};
use std::path::Path;

/// Attribute value carried by a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Logical(bool),
    Null,
}

/// Named attribute of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: AttributeValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// String-based equality against a filter value.
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.value {
            AttributeValue::Text(s) => s == candidate,
            AttributeValue::Number(n) => candidate
                .trim()
                .parse::<f64>()
                .map(|c| c == *n)
                .unwrap_or(false),
            AttributeValue::Logical(b) => parse_logical(candidate) == Some(*b),
            AttributeValue::Null => false,
        }
    }
}

fn parse_logical(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" => Some(true),
        "f" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}

/// One geometry with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: Vec<Field>,
    pub shape: Shape,
}

/// What a source declares before any record is read.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub declared_fields: Vec<String>,
    pub shape_type: ShapeType,
}

/// Forward-only stream of records from one dataset.
pub trait RecordSource {
    fn info(&self) -> &SourceInfo;

    /// Next record, `Ok(None)` once the source is drained.
    fn next_record(&mut self) -> Result<Option<Record>>;

    /// Release the underlying resource.
    fn close(self) -> Result<()>;
}

/// Opens record sources by path.
pub trait SourceOpener {
    type Source: RecordSource;

    /// Open a source. Sources whose shape type is not supported must fail here.
    fn open(&self, path: &Path) -> Result<Self::Source>;
}

pub mod memory {
    //! In-memory datasets keyed by path.

    use super::{Record, RecordSource, SourceInfo, SourceOpener};
    use crate::error::{ConvertError, Result};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone)]
    pub struct MemoryDataset {
        pub info: SourceInfo,
        pub records: Vec<Record>,
    }

    /// Opener over a fixed set of datasets.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryOpener {
        datasets: HashMap<PathBuf, MemoryDataset>,
    }

    impl MemoryOpener {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dataset(
            mut self,
            path: impl Into<PathBuf>,
            info: SourceInfo,
            records: Vec<Record>,
        ) -> Self {
            self.datasets
                .insert(path.into(), MemoryDataset { info, records });
            self
        }
    }

    impl SourceOpener for MemoryOpener {
        type Source = MemorySource;

        fn open(&self, path: &Path) -> Result<MemorySource> {
            let dataset =
                self.datasets
                    .get(path)
                    .ok_or_else(|| ConvertError::SourceOpenFailure {
                        path: path.display().to_string(),
                        message: "no such dataset".to_string(),
                    })?;
            Ok(MemorySource {
                info: dataset.info.clone(),
                records: dataset.records.clone().into_iter(),
            })
        }
    }

    pub struct MemorySource {
        info: SourceInfo,
        records: std::vec::IntoIter<Record>,
    }

    impl RecordSource for MemorySource {
        fn info(&self) -> &SourceInfo {
            &self.info
        }

        fn next_record(&mut self) -> Result<Option<Record>> {
            Ok(self.records.next())
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }
}
