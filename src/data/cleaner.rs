//! Data Cleaner Module
//! Column pruning, null accounting, and single-value row filters.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
}

/// Remove the named columns.
///
/// Strict policy: naming a column that is not present is an error rather
/// than a no-op, so schema drift in the source file surfaces immediately.
pub fn drop_columns(df: &DataFrame, names: &[&str]) -> Result<DataFrame, CleanError> {
    for name in names {
        ensure_column(df, name)?;
    }

    let keep: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|c| !names.contains(&c.as_str()))
        .collect();

    Ok(df.select(keep)?)
}

/// Per-column null counts, in column order. Informational only.
pub fn count_nulls(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count()))
        .collect()
}

/// Keep the rows where `column == value`, preserving row order.
pub fn filter_equals(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame, CleanError> {
    ensure_column(df, column)?;

    let filtered = df
        .clone()
        .lazy()
        .filter(col(column).eq(lit(value)))
        .collect()?;

    Ok(filtered)
}

fn ensure_column(df: &DataFrame, column: &str) -> Result<(), CleanError> {
    if df.get_column_names().iter().any(|c| c.as_str() == column) {
        Ok(())
    } else {
        Err(CleanError::MissingColumn(column.to_string()))
    }
}
