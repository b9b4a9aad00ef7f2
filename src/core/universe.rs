//! Loading the two candidate universes from CSV files.

use crate::core::error::AllocationError;
use crate::core::security::Listing;
use std::path::Path;
use tracing::debug;

const SYMBOL_COLUMN: &str = "Symbol";
const SECTOR_COLUMN: &str = "Sector";

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, AllocationError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| AllocationError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn column_index(
    headers: &csv::StringRecord,
    path: &Path,
    column: &'static str,
) -> Result<usize, AllocationError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| AllocationError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
}

/// Reads `(symbol, sector?)` pairs, skipping rows with a blank symbol.
fn read_rows(
    path: &Path,
    with_sector: bool,
) -> Result<Vec<(String, Option<String>)>, AllocationError> {
    let mut reader = open(path)?;
    let csv_error = |source| AllocationError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_error)?.clone();
    let symbol_idx = column_index(&headers, path, SYMBOL_COLUMN)?;
    let sector_idx = if with_sector {
        Some(column_index(&headers, path, SECTOR_COLUMN)?)
    } else {
        None
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let symbol = record.get(symbol_idx).unwrap_or_default();
        if symbol.is_empty() {
            continue;
        }
        let sector = sector_idx.map(|idx| record.get(idx).unwrap_or_default().to_string());
        rows.push((symbol.to_string(), sector));
    }
    debug!(path = %path.display(), rows = rows.len(), "Loaded universe");
    Ok(rows)
}

/// Reads mid-cap symbols from the `Symbol` column. Sectors are looked up later.
pub fn load_mid_cap(path: &Path) -> Result<Vec<String>, AllocationError> {
    Ok(read_rows(path, false)?
        .into_iter()
        .map(|(symbol, _)| symbol)
        .collect())
}

/// Reads S&P 500 listings from the `Symbol` and `Sector` columns.
pub fn load_broad_market(path: &Path) -> Result<Vec<Listing>, AllocationError> {
    Ok(read_rows(path, true)?
        .into_iter()
        .map(|(symbol, sector)| Listing::new(symbol, sector.unwrap_or_default()))
        .collect())
}
