//! Aggregation Module
//! Pure view-in/view-out filters and group-by counting over a DataFrame.
//!
//! Every function returns a new frame (or a [`GroupCount`]); the input view
//! is never mutated. Derived columns therefore only exist on views built
//! from the returned value, which keeps composite keys consistent with the
//! exact view being aggregated.

use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("group_count takes 1 or 2 key columns, got {0}")]
    BadKeyCount(usize),
}

/// Result of a one- or two-key group-by count.
///
/// Entries are kept in first-occurrence order of the key tuple within the
/// source view. [`GroupCount::top_n`] sorts stably, so groups with equal
/// counts keep that order.
#[derive(Debug, Clone)]
pub struct GroupCount {
    keys: Vec<String>,
    entries: Vec<(Vec<String>, u32)>,
}

impl GroupCount {
    /// The grouping column names, in grouping order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// All `(key tuple, count)` pairs.
    pub fn entries(&self) -> &[(Vec<String>, u32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all group counts; equals the row count of the grouped view.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| u64::from(*c)).sum()
    }

    /// Count for an exact key tuple, if the group exists.
    pub fn get(&self, key: &[&str]) -> Option<u32> {
        self.entries
            .iter()
            .find(|(k, _)| k.iter().map(String::as_str).eq(key.iter().copied()))
            .map(|(_, c)| *c)
    }

    /// All entries, descending by count. Ties keep first-occurrence order.
    pub fn sorted_desc(&self) -> GroupCount {
        self.top_n(self.entries.len())
    }

    /// The `n` largest groups, descending by count. Ties keep
    /// first-occurrence order (stable sort).
    pub fn top_n(&self, n: usize) -> GroupCount {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        GroupCount {
            keys: self.keys.clone(),
            entries,
        }
    }

    /// Entries reordered by the numeric value of the first key. Used for
    /// year axes, where display order is chronological rather than by count.
    pub fn sorted_by_key_numeric(&self) -> GroupCount {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|(k, _)| k[0].parse::<i64>().unwrap_or(i64::MAX));
        GroupCount {
            keys: self.keys.clone(),
            entries,
        }
    }
}

/// Keep the rows whose `column` value is one of `values`.
pub fn filter_in(
    df: &DataFrame,
    column: &str,
    values: &[&str],
) -> Result<DataFrame, AggregateError> {
    ensure_column(df, column)?;

    let mut predicate = lit(false);
    for value in values {
        predicate = predicate.or(col(column).eq(lit(*value)));
    }

    Ok(df.clone().lazy().filter(predicate).collect()?)
}

/// Keep the rows where `low <= column <= high` (inclusive on both ends).
pub fn filter_range(
    df: &DataFrame,
    column: &str,
    low: i64,
    high: i64,
) -> Result<DataFrame, AggregateError> {
    ensure_column(df, column)?;

    let predicate = col(column).gt_eq(lit(low)).and(col(column).lt_eq(lit(high)));
    Ok(df.clone().lazy().filter(predicate).collect()?)
}

/// Add `new_column = col_a + separator + col_b` for every row.
///
/// The composite value is null when either input is null. The column only
/// exists on the returned frame, so it must be derived on the exact view
/// that will later be filtered or aggregated.
pub fn derive_concat(
    df: &DataFrame,
    new_column: &str,
    col_a: &str,
    col_b: &str,
    separator: &str,
) -> Result<DataFrame, AggregateError> {
    ensure_column(df, col_a)?;
    ensure_column(df, col_b)?;

    let out = df
        .clone()
        .lazy()
        .with_column(concat_str([col(col_a), col(col_b)], separator, false).alias(new_column))
        .collect()?;

    Ok(out)
}

const COUNT_COL: &str = "__count";

/// Count rows per distinct key tuple over 1 or 2 key columns.
///
/// Group order is stable by first occurrence in the input view.
pub fn group_count(df: &DataFrame, keys: &[&str]) -> Result<GroupCount, AggregateError> {
    if keys.is_empty() || keys.len() > 2 {
        return Err(AggregateError::BadKeyCount(keys.len()));
    }
    for key in keys {
        ensure_column(df, key)?;
    }

    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let grouped = df
        .clone()
        .lazy()
        .group_by_stable(key_exprs)
        .agg([len().alias(COUNT_COL)])
        .collect()?;

    let counts = grouped.column(COUNT_COL)?.cast(&DataType::UInt32)?;
    let counts = counts.u32()?;

    let key_series: Vec<Series> = keys
        .iter()
        .map(|k| grouped.column(k).map(|c| c.as_materialized_series().clone()))
        .collect::<Result<_, PolarsError>>()?;

    let mut entries = Vec::with_capacity(grouped.height());
    for i in 0..grouped.height() {
        let mut tuple = Vec::with_capacity(keys.len());
        for series in &key_series {
            let value = series.get(i)?;
            tuple.push(any_value_to_string(&value));
        }
        entries.push((tuple, counts.get(i).unwrap_or(0)));
    }

    Ok(GroupCount {
        keys: keys.iter().map(|k| (*k).to_string()).collect(),
        entries,
    })
}

/// Bare cell text for a key value (Polars quotes strings in Display output).
fn any_value_to_string(value: &AnyValue) -> String {
    if value.is_null() {
        "null".to_string()
    } else {
        value.to_string().trim_matches('"').to_string()
    }
}

fn ensure_column(df: &DataFrame, column: &str) -> Result<(), AggregateError> {
    if df.get_column_names().iter().any(|c| c.as_str() == column) {
        Ok(())
    } else {
        Err(AggregateError::MissingColumn(column.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Make" => ["TESLA", "TESLA", "NISSAN", "FORD", "NISSAN", "TESLA"],
            "Model" => ["MODEL 3", "MODEL Y", "LEAF", "MUSTANG MACH-E", "LEAF", "MODEL 3"],
            "Electric Vehicle Type" => ["BEV", "BEV", "BEV", "BEV", "BEV", "BEV"],
            "Model Year" => [2020i32, 2022, 2018, 2021, 2019, 2022],
        )
        .unwrap()
    }

    #[test]
    fn filter_in_keeps_only_member_rows() {
        let out = filter_in(&sample(), "Make", &["TESLA", "FORD"]).unwrap();
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn filter_in_with_no_values_keeps_nothing() {
        let out = filter_in(&sample(), "Make", &[]).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn filter_range_is_inclusive_on_both_ends() {
        let out = filter_range(&sample(), "Model Year", 2019, 2021).unwrap();
        assert_eq!(out.height(), 3);

        let years = filter_range(&sample(), "Model Year", 2022, 2022).unwrap();
        assert_eq!(years.height(), 2);
    }

    #[test]
    fn derive_concat_joins_both_columns() {
        let out = derive_concat(&sample(), "Make & Model", "Make", "Model", " ").unwrap();
        let combined: Vec<String> = out
            .column("Make & Model")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(combined[0], "TESLA MODEL 3");
        assert_eq!(combined[3], "FORD MUSTANG MACH-E");
        assert_eq!(combined.len(), 6);
    }

    #[test]
    fn group_count_sums_to_view_height() {
        let df = sample();
        let gc = group_count(&df, &["Make"]).unwrap();
        assert_eq!(gc.total(), df.height() as u64);
        assert_eq!(gc.get(&["TESLA"]), Some(3));
        assert_eq!(gc.get(&["NISSAN"]), Some(2));
        assert_eq!(gc.get(&["FORD"]), Some(1));
    }

    #[test]
    fn group_count_preserves_first_occurrence_order() {
        let gc = group_count(&sample(), &["Make"]).unwrap();
        let order: Vec<&str> = gc.entries().iter().map(|(k, _)| k[0].as_str()).collect();
        assert_eq!(order, ["TESLA", "NISSAN", "FORD"]);
    }

    #[test]
    fn group_count_with_two_keys() {
        let gc = group_count(&sample(), &["Make", "Model"]).unwrap();
        assert_eq!(gc.get(&["TESLA", "MODEL 3"]), Some(2));
        assert_eq!(gc.get(&["NISSAN", "LEAF"]), Some(2));
        assert_eq!(gc.total(), 6);
    }

    #[test]
    fn group_count_rejects_three_keys() {
        let err = group_count(&sample(), &["Make", "Model", "Model Year"]).unwrap_err();
        assert!(matches!(err, AggregateError::BadKeyCount(3)));
    }

    #[test]
    fn top_n_is_descending_and_bounded() {
        let gc = group_count(&sample(), &["Make"]).unwrap();
        let top = gc.top_n(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top.entries()[0], (vec!["TESLA".to_string()], 3));
        assert_eq!(top.entries()[1], (vec!["NISSAN".to_string()], 2));
        assert!(gc.top_n(10).len() <= gc.len());
    }

    #[test]
    fn top_n_breaks_ties_by_first_occurrence() {
        let df = df!(
            "Make" => ["KIA", "VOLVO", "KIA", "VOLVO", "JEEP"],
        )
        .unwrap();
        let top = group_count(&df, &["Make"]).unwrap().top_n(3);
        let order: Vec<&str> = top.entries().iter().map(|(k, _)| k[0].as_str()).collect();
        // KIA and VOLVO both count 2; KIA appeared first.
        assert_eq!(order, ["KIA", "VOLVO", "JEEP"]);
    }

    #[test]
    fn sorted_by_key_numeric_orders_years() {
        let gc = group_count(&sample(), &["Model Year"]).unwrap().sorted_by_key_numeric();
        let years: Vec<&str> = gc.entries().iter().map(|(k, _)| k[0].as_str()).collect();
        assert_eq!(years, ["2018", "2019", "2020", "2021", "2022"]);
    }
}
