//! CSV persistence.

use crate::config::Source;
use crate::error::Result;
use crate::record::{Record, ResultSet, CANONICAL_COLUMNS};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `<source>_<term>.csv`, with spaces in the term replaced by underscores.
///
/// Path separators are replaced too so the file always lands in the
/// output directory.
pub fn csv_filename(source: Source, term: &str) -> String {
    let safe_term: String = term
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("{}_{}.csv", source.name(), safe_term)
}

/// Full output path for a run
pub fn csv_path(output_dir: &Path, source: Source, term: &str) -> PathBuf {
    output_dir.join(csv_filename(source, term))
}

/// Write records with the canonical header, overwriting `path`.
pub fn write_csv(path: &Path, records: &ResultSet) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(CANONICAL_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), count = records.len(), "Saved CSV");
    Ok(())
}

/// Read a file produced by [`write_csv`] back into a result set.
pub fn read_csv(path: &Path) -> Result<ResultSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let records = rdr
        .deserialize::<Record>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(path = %path.display(), count = records.len(), "Loaded CSV");
    Ok(ResultSet::from(records))
}
