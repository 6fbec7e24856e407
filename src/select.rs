// Record selection across all input sources

use crate::error::{ConvertError, Outcome, Result};
use crate::filter::FilterSet;
use crate::geometry::Shape;
use crate::source::{RecordSource, SourceOpener};
use std::collections::BTreeSet;
use std::path::Path;

/// Shapes retained from every source, in source then record order.
#[derive(Debug, Clone)]
pub struct Selection {
    pub shapes: Vec<Shape>,
    /// Filter field names declared by at least one source.
    pub observed_fields: BTreeSet<String>,
    pub records_scanned: usize,
}

/// Scan every source in order and keep the shapes the filters accept
pub fn select<O, P>(opener: &O, paths: &[P], filters: &FilterSet) -> Result<Selection>
where
    O: SourceOpener,
    P: AsRef<Path>,
{
    let mut selection = Selection {
        shapes: Vec::new(),
        observed_fields: BTreeSet::new(),
        records_scanned: 0,
    };

    for path in paths {
        let path = path.as_ref();
        let mut source = opener.open(path)?;

        // Released even when the scan failed; the scan error takes precedence
        let scanned = scan_source(&mut source, filters, &mut selection);
        let (scanned, kept) = Outcome::new(scanned)
            .release(source.close())
            .into_result()?;

        log::info!(
            "{}: kept {} of {} records",
            path.display(),
            kept,
            scanned
        );
        selection.records_scanned += scanned;
    }

    // Unknown names are checked against every source at once
    for filter in filters.iter() {
        if !selection.observed_fields.contains(&filter.name) {
            return Err(ConvertError::UnknownFilterField(filter.name.clone()));
        }
    }

    if selection.shapes.is_empty() {
        return Err(ConvertError::NoRecordsSelected);
    }

    Ok(selection)
}

/// Returns (records scanned, records kept) for one source.
fn scan_source<S: RecordSource>(
    source: &mut S,
    filters: &FilterSet,
    selection: &mut Selection,
) -> Result<(usize, usize)> {
    for filter in filters.iter() {
        if source.info().declared_fields.iter().any(|f| *f == filter.name) {
            selection.observed_fields.insert(filter.name.clone());
        }
    }

    let mut scanned = 0;
    let mut kept = 0;
    while let Some(record) = source.next_record()? {
        scanned += 1;
        if filters.retains(&record.fields) {
            selection.shapes.push(record.shape);
            kept += 1;
        }
    }
    Ok((scanned, kept))
}
