// Error taxonomy for the conversion pipeline

use thiserror::Error;

/// Every failure the conversion can report. All of them end the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid filter expression '{0}'")]
    InvalidFilterExpression(String),

    #[error("missing name or values from '{0}'")]
    EmptyFilterComponent(String),

    #[error("unrecognized field '{0}' not present in any shapefile")]
    UnknownFilterField(String),

    #[error("no records selected")]
    NoRecordsSelected,

    #[error("unsupported shape type '{shape_type}' in '{path}'")]
    UnsupportedShapeType { path: String, shape_type: String },

    #[error("failed to open shapefile archive '{path}': {message}")]
    SourceOpenFailure { path: String, message: String },

    #[error("failed to read shapefile archive '{path}': {message}")]
    SourceReadFailure { path: String, message: String },

    #[error("failed to project shapes: {0}")]
    ProjectionFailure(String),

    #[error("failed to write '{path}': {message}")]
    DestinationWriteFailure { path: String, message: String },

    #[error("failed to close shapefile archive '{path}': {message}")]
    SourceCloseFailure { path: String, message: String },

    /// Extent requested over an empty shape collection.
    #[error("invalid render option: {0}")]
    InvalidRenderOptions(String),

    #[error("cannot compute the extent of an empty shape collection")]
    EmptyExtent,
}

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Result of a scoped operation plus the cleanup error it may have hidden.
///
/// The first error wins: a release failure only becomes the primary error when
/// the work itself succeeded. Otherwise it is kept as `suppressed`.
#[derive(Debug)]
pub struct Outcome<T> {
    pub result: Result<T>,
    pub suppressed: Option<ConvertError>,
}

impl<T> Outcome<T> {
    pub fn new(result: Result<T>) -> Self {
        Self {
            result,
            suppressed: None,
        }
    }

    /// Fold the result of releasing a resource into this outcome.
    pub fn release(mut self, released: Result<()>) -> Self {
        if let Err(err) = released {
            if self.result.is_ok() {
                self.result = Err(err);
            } else if self.suppressed.is_none() {
                self.suppressed = Some(err);
            }
        }
        self
    }

    pub fn into_result(self) -> Result<T> {
        if let Some(err) = &self.suppressed {
            log::warn!("suppressed cleanup error: {}", err);
        }
        self.result
    }
}
