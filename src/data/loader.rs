//! CSV Data Loader Module
//! Handles CSV file loading using Polars.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV file not found: {0}")]
    FileNotFound(String),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file contained no rows")]
    Empty,
}

/// Load a registration CSV using Polars.
///
/// Column types are inferred from the first 10 000 rows. A cell that fails
/// type coercion (e.g. a non-numeric Model Year) becomes null rather than
/// aborting the load; the row itself is kept.
pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
    if !file_path.exists() {
        return Err(LoaderError::FileNotFound(file_path.display().to_string()));
    }

    // Lazy scan, collected once.
    let df = LazyCsvReader::new(file_path)
        .with_infer_schema_length(Some(10_000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;

    if df.height() == 0 {
        return Err(LoaderError::Empty);
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported() {
        let err = load_csv(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }
}
