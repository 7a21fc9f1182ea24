//! Best-effort reclassification of text columns whose values are semantically
//! dates, booleans, or numbers. The heuristics are explicit and pure: given a
//! column name and its raw cells, `classify_and_coerce` returns a fresh
//! `Series` and never mutates anything. Ambiguous columns may coerce wrongly;
//! that is accepted behavior.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use crate::error::AppError;

/// Column-name fragments that trigger the date parsing attempt.
pub const DATE_NAME_HINTS: [&str; 5] = ["date", "time", "dt", "year", "month"];

const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

// Ambiguous slash dates resolve month-first; day-first is the fallback.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

// Cheap shape check so we don't run strptime over every cell of every column.
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,4}[-/]\d{1,2}[-/]\d{1,4}([ T]\d{1,2}:\d{2}(:\d{2})?)?$")
        .expect("date shape regex is valid")
});

pub fn has_date_name_hint(name: &str) -> bool {
    let lower = name.to_lowercase();
    DATE_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if !DATE_SHAPE.is_match(value) {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    None
}

enum NumericColumn {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
}

/// Classify a loaded text column and build its `Series`:
/// 1. a date-hinted name whose non-null values all parse becomes Date;
/// 2. all-true/false values become Boolean;
/// 3. values that parse numerically after stripping thousands commas and a
///    leading currency symbol become Int64 (all integral) or Float64;
/// 4. everything else stays text.
pub fn classify_and_coerce(name: &str, values: &[Option<String>]) -> Result<Series, AppError> {
    if has_date_name_hint(name) {
        if let Some(days) = try_dates(values) {
            return Ok(Series::new(name, days).cast(&DataType::Date)?);
        }
    }
    if let Some(flags) = try_booleans(values) {
        return Ok(Series::new(name, flags));
    }
    match try_numeric(values) {
        Some(NumericColumn::Int(ints)) => return Ok(Series::new(name, ints)),
        Some(NumericColumn::Float(floats)) => return Ok(Series::new(name, floats)),
        None => {}
    }
    Ok(Series::new(name, values))
}

/// All non-null values must parse, and there must be at least one.
/// Returns days since the Unix epoch, ready for a Date cast.
fn try_dates(values: &[Option<String>]) -> Option<Vec<Option<i32>>> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    let mut days = Vec::with_capacity(values.len());
    let mut parsed_any = false;
    for value in values {
        match value {
            None => days.push(None),
            Some(raw) => {
                let date = parse_date(raw)?;
                parsed_any = true;
                days.push(Some((date - epoch).num_days() as i32));
            }
        }
    }
    parsed_any.then_some(days)
}

fn try_booleans(values: &[Option<String>]) -> Option<Vec<Option<bool>>> {
    let mut flags = Vec::with_capacity(values.len());
    let mut parsed_any = false;
    for value in values {
        match value {
            None => flags.push(None),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    flags.push(Some(true));
                } else if trimmed.eq_ignore_ascii_case("false") {
                    flags.push(Some(false));
                } else {
                    return None;
                }
                parsed_any = true;
            }
        }
    }
    parsed_any.then_some(flags)
}

fn clean_numeric(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c| CURRENCY_SYMBOLS.contains(&c))
        .replace(',', "")
}

fn try_numeric(values: &[Option<String>]) -> Option<NumericColumn> {
    let mut floats = Vec::with_capacity(values.len());
    let mut ints = Vec::with_capacity(values.len());
    let mut all_int = true;
    let mut parsed_any = false;
    for value in values {
        match value {
            None => {
                floats.push(None);
                ints.push(None);
            }
            Some(raw) => {
                let cleaned = clean_numeric(raw);
                let float: f64 = cleaned.parse().ok()?;
                parsed_any = true;
                floats.push(Some(float));
                match cleaned.parse::<i64>() {
                    Ok(int) => ints.push(Some(int)),
                    Err(_) => {
                        all_int = false;
                        ints.push(None);
                    }
                }
            }
        }
    }
    if !parsed_any {
        return None;
    }
    Some(if all_int {
        NumericColumn::Int(ints)
    } else {
        NumericColumn::Float(floats)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(parse_date("2023-01-05"), Some(expected));
        assert_eq!(parse_date("2023/01/05"), Some(expected));
        assert_eq!(parse_date("2023-01-05 10:30:00"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("1234"), None);
    }

    #[test]
    fn test_ambiguous_slash_dates_parse_month_first() {
        assert_eq!(
            parse_date("05/01/2023"),
            NaiveDate::from_ymd_opt(2023, 5, 1)
        );
        // month 13 is impossible, so day-first takes over
        assert_eq!(
            parse_date("13/01/2023"),
            NaiveDate::from_ymd_opt(2023, 1, 13)
        );
    }

    #[test]
    fn test_date_hint_column_coerces() {
        let series =
            classify_and_coerce("signup_date", &cells(&["2023-01-05", "2023-02-10"])).unwrap();
        assert_eq!(series.dtype(), &DataType::Date);
    }

    #[test]
    fn test_date_hint_falls_back_to_numeric() {
        // "year" hints a date, but plain integers don't parse as dates
        let series = classify_and_coerce("year", &cells(&["2021", "2022"])).unwrap();
        assert_eq!(series.dtype(), &DataType::Int64);
    }

    #[test]
    fn test_currency_and_thousands_coercion() {
        let series = classify_and_coerce("amount", &cells(&["$1,200.50", "$950"])).unwrap();
        assert_eq!(series.dtype(), &DataType::Float64);
        let values: Vec<f64> = series.f64().unwrap().into_iter().flatten().collect();
        assert_eq!(values, vec![1200.50, 950.0]);
    }

    #[test]
    fn test_integer_column() {
        let series = classify_and_coerce("id", &cells(&["1", "2", "3"])).unwrap();
        assert_eq!(series.dtype(), &DataType::Int64);
    }

    #[test]
    fn test_boolean_column() {
        let series = classify_and_coerce("active", &cells(&["true", "FALSE", "True"])).unwrap();
        assert_eq!(series.dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let series = classify_and_coerce("notes", &cells(&["12", "hello"])).unwrap();
        assert_eq!(series.dtype(), &DataType::String);
    }

    #[test]
    fn test_nulls_survive_coercion() {
        let values = vec![Some("10".to_string()), None, Some("30".to_string())];
        let series = classify_and_coerce("count", &values).unwrap();
        assert_eq!(series.dtype(), &DataType::Int64);
        assert_eq!(series.null_count(), 1);
    }

    #[test]
    fn test_all_null_column_stays_text() {
        let values: Vec<Option<String>> = vec![None, None];
        let series = classify_and_coerce("date_col", &values).unwrap();
        assert_eq!(series.dtype(), &DataType::String);
    }
}
