//! Record construction: one CSV (plus optional metadata) in, one
//! [`PublishableRecord`] out.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use resultgen_markdown::Table;
use resultgen_shared::{GenerateConfig, PublishableRecord, Result, ResultgenError, SourceFile};

use crate::metadata::resolve_metadata;

/// A record together with the non-fatal issues found while building it.
#[derive(Debug, Clone)]
pub struct BuiltRecord {
    pub record: PublishableRecord,
    pub warnings: Vec<String>,
}

/// Build the publishable record for one discovered source.
///
/// Any error here concerns this source only; the caller decides to skip it.
#[instrument(skip_all, fields(stem = %source.stem))]
pub fn build_record(
    source: &SourceFile,
    config: &GenerateConfig,
    today: NaiveDate,
) -> Result<BuiltRecord> {
    let table = load_table(&source.csv_path, config.max_csv_bytes)?;
    let meta = resolve_metadata(&source.stem, source.metadata_path.as_deref(), today)?;

    let mut warnings = Vec::new();
    if !table.adjusted_rows.is_empty() {
        warnings.push(format!(
            "{}: rows {:?} did not have {} columns and were padded or truncated",
            source.csv_path.display(),
            table.adjusted_rows,
            table.width()
        ));
    }

    debug!(
        columns = table.width(),
        rows = table.rows.len(),
        title = %meta.title,
        date = %meta.date.display,
        "record built"
    );

    let record = PublishableRecord {
        slug: source.stem.clone(),
        title: meta.title,
        date: meta.date,
        excerpt: meta.excerpt,
        image: meta.image,
        author: meta.author,
        extra: meta.extra,
        introduction: meta.introduction,
        table: table.to_markdown(),
        source: source.csv_path.clone(),
    };

    Ok(BuiltRecord { record, warnings })
}

/// Read and parse a CSV file, refusing anything over `max_bytes`.
pub fn load_table(path: &Path, max_bytes: u64) -> Result<Table> {
    let size = std::fs::metadata(path)
        .map_err(|e| ResultgenError::io(path, e))?
        .len();
    if size > max_bytes {
        return Err(ResultgenError::table(
            path,
            format!(
                "file too large: {:.1} MiB (limit {:.1} MiB)",
                mib(size),
                mib(max_bytes)
            ),
        ));
    }

    let data = std::fs::read(path).map_err(|e| ResultgenError::io(path, e))?;
    Table::from_csv(&data, path)
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
