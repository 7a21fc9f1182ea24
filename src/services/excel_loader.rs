//! Excel path of the Table Loader: open the workbook, resolve a sheet, and
//! build a DataFrame from its cells using calamine's cell types.

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use polars::prelude::*;

use crate::error::AppError;
use crate::models::{SheetDims, SheetTable};
use crate::services::{refine, source};

/// A column takes a non-text type when at least this share of its non-empty
/// cells agree on it.
const TYPE_THRESHOLD: f64 = 0.8;

/// Days between the Excel serial epoch (1899-12-30) and the Unix epoch.
const EXCEL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

const MS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Numeric,
    Date,
    Boolean,
    Text,
    Empty,
}

/// Report every sheet's dimensions without materializing row data.
/// Row counts exclude the header row.
pub fn list_sheets(path: &Path) -> Result<Vec<SheetDims>, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::FileProcessing(format!("Failed to open Excel file: {e}")))?;
    let names = workbook.sheet_names().to_vec();
    tracing::info!("found {} sheets", names.len());
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| AppError::FileProcessing(format!("Failed to read worksheet {name}: {e}")))?;
        let (height, width) = range.get_size();
        sheets.push(SheetDims {
            name,
            rows: height.saturating_sub(1),
            columns: width,
        });
    }
    Ok(sheets)
}

/// Load a single sheet into a DataFrame. The first row is the header;
/// header cells are cleaned and deduplicated.
pub fn load_sheet(path: &Path, selector: Option<&str>) -> Result<SheetTable, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::FileProcessing(format!("Failed to open Excel file: {e}")))?;
    let names = workbook.sheet_names().to_vec();
    let sheet_name = source::resolve_sheet(selector, &names)?;
    tracing::info!("loading sheet {sheet_name}");
    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        AppError::FileProcessing(format!("Failed to read worksheet {sheet_name}: {e}"))
    })?;
    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    if rows.is_empty() {
        return Ok(SheetTable {
            df: DataFrame::empty(),
            sheet_name,
        });
    }
    let mut existing = HashSet::new();
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|cell| clean_column_name(&cell.to_string(), &mut existing))
        .collect();
    let df = build_dataframe(&rows, &headers)?;
    Ok(SheetTable { df, sheet_name })
}

/// Build a DataFrame from raw sheet rows (header row included in `rows`).
pub fn build_dataframe(rows: &[Vec<Data>], headers: &[String]) -> Result<DataFrame, AppError> {
    let mut columns = Vec::with_capacity(headers.len());
    for (col, header) in headers.iter().enumerate() {
        let values: Vec<Data> = rows
            .iter()
            .skip(1)
            .map(|row| row.get(col).cloned().unwrap_or(Data::Empty))
            .collect();
        columns.push(build_series(header, &values)?);
    }
    Ok(DataFrame::new(columns)?)
}

fn build_series(name: &str, values: &[Data]) -> Result<Series, AppError> {
    match detect_column_kind(values) {
        CellKind::Numeric => {
            let nums: Vec<Option<f64>> = values
                .iter()
                .map(|v| match v {
                    Data::Float(f) => Some(*f),
                    Data::Int(i) => Some(*i as f64),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name, nums))
        }
        CellKind::Date => {
            let stamps: Vec<Option<i64>> = values.iter().map(cell_timestamp_ms).collect();
            Ok(Series::new(name, stamps)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
        }
        CellKind::Boolean => {
            let flags: Vec<Option<bool>> = values
                .iter()
                .map(|v| match v {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name, flags))
        }
        CellKind::Text | CellKind::Empty => {
            let text: Vec<Option<String>> = values
                .iter()
                .map(|v| match v {
                    Data::Empty => None,
                    _ => Some(v.to_string()),
                })
                .collect();
            Ok(Series::new(name, text))
        }
    }
}

fn detect_column_kind(values: &[Data]) -> CellKind {
    let mut numeric = 0usize;
    let mut date = 0usize;
    let mut boolean = 0usize;
    let mut total = 0usize;
    for value in values.iter().filter(|v| !matches!(v, Data::Empty)) {
        total += 1;
        match value {
            Data::Float(_) | Data::Int(_) => numeric += 1,
            Data::DateTime(_) | Data::DateTimeIso(_) => date += 1,
            Data::String(s) if refine::parse_date(s).is_some() => date += 1,
            Data::Bool(_) => boolean += 1,
            _ => {}
        }
    }
    if total == 0 {
        return CellKind::Empty;
    }
    let threshold = total as f64 * TYPE_THRESHOLD;
    if numeric as f64 >= threshold {
        CellKind::Numeric
    } else if date as f64 >= threshold {
        CellKind::Date
    } else if boolean as f64 >= threshold {
        CellKind::Boolean
    } else {
        CellKind::Text
    }
}

fn cell_timestamp_ms(value: &Data) -> Option<i64> {
    match value {
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            Some(((serial - EXCEL_EPOCH_OFFSET_DAYS) * MS_PER_DAY).round() as i64)
        }
        Data::DateTimeIso(iso) => NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S")
            .ok()
            .map(|dt| dt.and_utc().timestamp_millis())
            .or_else(|| date_string_ms(iso)),
        Data::String(s) => date_string_ms(s),
        _ => None,
    }
}

fn date_string_ms(value: &str) -> Option<i64> {
    let date = refine::parse_date(value)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis())
}

/// Header cells become lowercase identifier-ish names; duplicates get a
/// numeric suffix.
pub fn clean_column_name(name: &str, existing_names: &mut HashSet<String>) -> String {
    let base_name = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>()
        .to_lowercase();

    let mut cleaned = if base_name.chars().next().map_or(true, |c| !c.is_alphabetic()) {
        format!("col_{base_name}")
    } else {
        base_name
    };

    let mut counter = 1;
    let original = cleaned.clone();
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{original}_{counter}");
        counter += 1;
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTime;

    fn sheet_rows() -> Vec<Vec<Data>> {
        vec![
            vec![
                Data::String("Name".to_string()),
                Data::String("Score".to_string()),
                Data::String("Active".to_string()),
            ],
            vec![
                Data::String("Alice".to_string()),
                Data::Float(91.5),
                Data::Bool(true),
            ],
            vec![
                Data::String("Bob".to_string()),
                Data::Int(78),
                Data::Bool(false),
            ],
            vec![Data::String("Cara".to_string()), Data::Empty, Data::Bool(true)],
        ]
    }

    #[test]
    fn test_build_dataframe_types() {
        let rows = sheet_rows();
        let mut existing = HashSet::new();
        let headers: Vec<String> = rows[0]
            .iter()
            .map(|c| clean_column_name(&c.to_string(), &mut existing))
            .collect();
        let df = build_dataframe(&rows, &headers).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.get_column_names(), &["name", "score", "active"]);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("score").unwrap().null_count(), 1);
        assert_eq!(df.column("active").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_detect_column_kind_threshold() {
        // 2 of 3 numeric is below the 0.8 threshold
        let mixed = vec![
            Data::Float(1.0),
            Data::Int(2),
            Data::String("x".to_string()),
        ];
        assert_eq!(detect_column_kind(&mixed), CellKind::Text);
        let numeric = vec![Data::Float(1.0), Data::Int(2)];
        assert_eq!(detect_column_kind(&numeric), CellKind::Numeric);
        assert_eq!(detect_column_kind(&[Data::Empty]), CellKind::Empty);
    }

    #[test]
    fn test_excel_serial_conversion() {
        // serial 44927 is 2023-01-01
        let dt = ExcelDateTime::new(
            44_927.0,
            calamine::ExcelDateTimeType::DateTime,
            false,
        );
        let ms = cell_timestamp_ms(&Data::DateTime(dt)).unwrap();
        let date = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
            .unwrap()
            .date_naive();
        assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn test_date_string_column() {
        let values = vec![
            Data::String("2023-01-05".to_string()),
            Data::String("2023-02-10".to_string()),
        ];
        assert_eq!(detect_column_kind(&values), CellKind::Date);
        let series = build_series("when", &values).unwrap();
        assert_eq!(
            series.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }

    #[test]
    fn test_clean_column_name() {
        let mut existing = HashSet::new();
        assert_eq!(clean_column_name("First Name", &mut existing), "first_name");
        assert_eq!(clean_column_name("First Name", &mut existing), "first_name_1");
        assert_eq!(clean_column_name("2024", &mut existing), "col_2024");
    }
}
