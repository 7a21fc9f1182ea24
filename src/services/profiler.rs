//! Descriptive statistics over a loaded table: per-column summaries, numeric
//! distribution stats, date ranges, categorical top values, missingness, and
//! whole-table quality flags.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use polars::prelude::*;
use smallvec::SmallVec;

use crate::error::AppError;
use crate::models::{
    ColumnProfile, DateRange, MissingColumn, NumericStats, QualityFlag, TableProfile, TopValue,
    TopValues, TOP_VALUE_COUNT,
};
use crate::services::render;

/// Values shown in a text column's summary string.
const SUMMARY_TOP_VALUES: usize = 3;
/// Character cap for the summary string.
const SUMMARY_MAX_LEN: usize = 50;
/// Character cap for the overview sample value.
const SAMPLE_MAX_LEN: usize = 30;
/// Top-value breakdowns cover at most this many text columns.
const TOP_VALUE_COLUMNS: usize = 6;

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
    )
}

/// Compute the full profile of a table in one pass over its columns.
pub fn profile_table(df: &DataFrame) -> Result<TableProfile, AppError> {
    let rows = df.height();
    tracing::info!("profiling {} rows x {} columns", rows, df.width());

    let mut column_profiles = Vec::with_capacity(df.width());
    let mut numeric = Vec::new();
    let mut dates = Vec::new();
    let mut top_values = Vec::new();
    let mut missing = Vec::new();
    let mut constant_columns = Vec::new();

    for series in df.get_columns() {
        let name = series.name().to_string();
        let null_count = series.null_count();
        let non_null = rows - null_count;
        let null_pct = if rows == 0 {
            0.0
        } else {
            null_count as f64 / rows as f64 * 100.0
        };
        let unique = unique_non_null(series)?;

        if is_numeric_dtype(series.dtype()) {
            numeric.push(numeric_stats(series)?);
        }
        if let Some((min, max, valid)) = date_bounds(series)? {
            dates.push(DateRange {
                name: name.clone(),
                min,
                max,
                valid,
            });
        }
        if series.dtype() == &DataType::String && top_values.len() < TOP_VALUE_COLUMNS {
            let counts = string_value_counts(series)?;
            let values: SmallVec<[TopValue; TOP_VALUE_COUNT]> = counts
                .iter()
                .take(TOP_VALUE_COUNT)
                .map(|(value, count)| TopValue {
                    value: value.clone(),
                    count: *count,
                    pct: if rows == 0 {
                        0.0
                    } else {
                        *count as f64 / rows as f64 * 100.0
                    },
                })
                .collect();
            top_values.push(TopValues {
                name: name.clone(),
                unique,
                values,
            });
        }
        if null_count > 0 {
            missing.push(MissingColumn {
                name: name.clone(),
                count: null_count,
                pct: null_count as f64 / rows as f64 * 100.0,
            });
        }
        if unique <= 1 {
            constant_columns.push(name.clone());
        }

        column_profiles.push(ColumnProfile {
            summary: column_summary(series)?,
            sample: first_sample(series)?,
            name,
            dtype: series.dtype().to_string(),
            non_null,
            null_count,
            null_pct,
            unique,
        });
    }

    missing.sort_by(|a, b| b.count.cmp(&a.count));

    let mut flags = Vec::new();
    let duplicates = duplicate_row_count(df);
    if duplicates > 0 {
        flags.push(QualityFlag::DuplicateRows(duplicates));
    }
    let total_missing: usize = missing.iter().map(|m| m.count).sum();
    if total_missing > 0 {
        flags.push(QualityFlag::MissingValues {
            total: total_missing,
            columns: missing.len(),
        });
    }
    if !constant_columns.is_empty() {
        flags.push(QualityFlag::ConstantColumns(constant_columns));
    }

    Ok(TableProfile {
        rows,
        columns: df.width(),
        column_profiles,
        numeric,
        dates,
        top_values,
        missing,
        flags,
    })
}

/// Unique count excluding nulls, which `n_unique` would otherwise count as a
/// distinct value.
fn unique_non_null(series: &Series) -> Result<usize, AppError> {
    let n = series.n_unique()?;
    Ok(if series.null_count() > 0 {
        n.saturating_sub(1)
    } else {
        n
    })
}

fn numeric_values(series: &Series) -> Result<Vec<f64>, AppError> {
    let casted = series.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().flatten().collect())
}

fn numeric_stats(series: &Series) -> Result<NumericStats, AppError> {
    let mut values = numeric_values(series)?;
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let count = values.len();
    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = match (count, mean) {
        (c, Some(m)) if c > 1 => {
            let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (c - 1) as f64;
            Some(var.sqrt())
        }
        _ => None,
    };
    Ok(NumericStats {
        name: series.name().to_string(),
        count,
        mean,
        std,
        min: values.first().copied(),
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values.last().copied(),
    })
}

/// Linear-interpolation quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn date_bounds(series: &Series) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AppError> {
    let valid = series.len() - series.null_count();
    if valid == 0 {
        return Ok(None);
    }
    match series.dtype() {
        DataType::Date => {
            let ca = series.date()?;
            let min = ca.min().and_then(render::date_from_days);
            let max = ca.max().and_then(render::date_from_days);
            Ok(min.zip(max).map(|(min, max)| (min, max, valid)))
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let ca = series.datetime()?;
            let min = ca
                .min()
                .and_then(|v| render::datetime_from_parts(v, unit))
                .map(|dt| dt.date());
            let max = ca
                .max()
                .and_then(|v| render::datetime_from_parts(v, unit))
                .map(|dt| dt.date());
            Ok(min.zip(max).map(|(min, max)| (min, max, valid)))
        }
        _ => Ok(None),
    }
}

/// Value counts for a text column, most frequent first; ties break on the
/// value itself so output is deterministic.
fn string_value_counts(series: &Series) -> Result<Vec<(String, usize)>, AppError> {
    let ca = series.str()?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in ca.into_iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(entries)
}

fn column_summary(series: &Series) -> Result<String, AppError> {
    if is_numeric_dtype(series.dtype()) {
        let values = numeric_values(series)?;
        if values.is_empty() {
            return Ok(String::new());
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        return Ok(format!(
            "min={}, mean={}, max={}",
            render::fmt_sig(min, 2),
            render::fmt_sig(mean, 2),
            render::fmt_sig(max, 2)
        ));
    }
    if let Some((min, max, _)) = date_bounds(series)? {
        return Ok(format!("{min} → {max}"));
    }
    if series.dtype() == &DataType::Boolean {
        let ca = series.bool()?;
        let trues = ca.into_iter().flatten().filter(|b| *b).count();
        let falses = series.len() - series.null_count() - trues;
        let summary = if trues >= falses {
            "true, false"
        } else {
            "false, true"
        };
        return Ok(summary.to_string());
    }
    if series.dtype() == &DataType::String {
        let top: Vec<String> = string_value_counts(series)?
            .into_iter()
            .take(SUMMARY_TOP_VALUES)
            .map(|(value, _)| value)
            .collect();
        return Ok(truncate_chars(&top.join(", "), SUMMARY_MAX_LEN));
    }
    Ok(String::new())
}

fn first_sample(series: &Series) -> Result<Option<String>, AppError> {
    for i in 0..series.len() {
        let value = series.get(i)?;
        if !matches!(value, AnyValue::Null) {
            return Ok(Some(truncate_chars(
                &render::cell_text(&value, None),
                SAMPLE_MAX_LEN,
            )));
        }
    }
    Ok(None)
}

/// Rows identical to an earlier row, counted once per extra occurrence.
fn duplicate_row_count(df: &DataFrame) -> usize {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    for i in 0..df.height() {
        if let Some(row) = df.get(i) {
            if !seen.insert(format!("{row:?}")) {
                duplicates += 1;
            }
        }
    }
    duplicates
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        let id = Series::new("id", vec![Some(1i64), Some(2), Some(3), Some(4)]);
        let amount = Series::new("amount", vec![Some(10.0f64), Some(20.0), None, Some(30.0)]);
        let city = Series::new(
            "city",
            vec![Some("NYC"), Some("NYC"), Some("LA"), Some("NYC")],
        );
        DataFrame::new(vec![id, amount, city]).unwrap()
    }

    #[test]
    fn test_null_percentage() {
        let profile = profile_table(&sample_df()).unwrap();
        let amount = &profile.column_profiles[1];
        assert_eq!(amount.null_count, 1);
        assert_eq!(amount.non_null, 3);
        assert!((amount.null_pct - 25.0).abs() < 1e-9);
        let total: usize = profile.missing.iter().map(|m| m.count).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_clean_table_has_no_flags() {
        let df = DataFrame::new(vec![
            Series::new("a", vec![1i64, 2, 3]),
            Series::new("b", vec!["x", "y", "z"]),
        ])
        .unwrap();
        let profile = profile_table(&df).unwrap();
        assert!(profile.flags.is_empty());
    }

    #[test]
    fn test_constant_column_flagged() {
        let df = DataFrame::new(vec![
            Series::new("a", vec![1i64, 2, 3]),
            Series::new("status", vec!["ok", "ok", "ok"]),
        ])
        .unwrap();
        let profile = profile_table(&df).unwrap();
        assert!(profile
            .flags
            .iter()
            .any(|f| matches!(f, QualityFlag::ConstantColumns(cols) if cols == &["status"])));
    }

    #[test]
    fn test_duplicate_rows_flagged() {
        let df = DataFrame::new(vec![
            Series::new("a", vec![1i64, 1, 2]),
            Series::new("b", vec!["x", "x", "y"]),
        ])
        .unwrap();
        let profile = profile_table(&df).unwrap();
        assert!(profile
            .flags
            .iter()
            .any(|f| matches!(f, QualityFlag::DuplicateRows(1))));
    }

    #[test]
    fn test_unique_excludes_nulls() {
        let series = Series::new("x", vec![Some("a"), Some("a"), None]);
        assert_eq!(unique_non_null(&series).unwrap(), 1);
    }

    #[test]
    fn test_numeric_stats() {
        let series = Series::new("v", vec![1.0f64, 2.0, 3.0, 4.0]);
        let stats = numeric_stats(&series).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, Some(2.5));
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(4.0));
        assert_eq!(stats.q25, Some(1.75));
        assert_eq!(stats.median, Some(2.5));
        assert_eq!(stats.q75, Some(3.25));
        let std = stats.std.unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-9);
    }

    #[test]
    fn test_top_values_sorted_and_capped() {
        let profile = profile_table(&sample_df()).unwrap();
        let city = &profile.top_values[0];
        assert_eq!(city.name, "city");
        assert_eq!(city.values[0].value, "NYC");
        assert_eq!(city.values[0].count, 3);
        assert!((city.values[0].pct - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_sorted_descending() {
        let df = DataFrame::new(vec![
            Series::new("a", vec![Some(1i64), None, None]),
            Series::new("b", vec![Some("x"), Some("y"), None]),
        ])
        .unwrap();
        let profile = profile_table(&df).unwrap();
        assert_eq!(profile.missing[0].name, "a");
        assert_eq!(profile.missing[0].count, 2);
        assert_eq!(profile.missing[1].name, "b");
    }

    #[test]
    fn test_numeric_summary_two_sig_digits() {
        let series = Series::new("amount", vec![950.0f64, 1200.5]);
        let summary = column_summary(&series).unwrap();
        assert_eq!(summary, "min=9.5e+02, mean=1.1e+03, max=1.2e+03");
    }
}
