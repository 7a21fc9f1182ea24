//! CSV path of the Table Loader: decode, parse with the resolved delimiter,
//! then run every column through the Type Refiner.

use std::collections::HashSet;
use std::path::Path;

use csv::ReaderBuilder;
use polars::prelude::*;

use crate::error::AppError;
use crate::models::CsvTable;
use crate::services::{refine, source};

/// Cell values treated as missing, matching the defaults of the usual
/// dataframe readers.
const NULL_MARKERS: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Load a CSV file. Unspecified encoding and separator are auto-detected.
pub fn load_csv(
    path: &Path,
    encoding: Option<&str>,
    separator: Option<char>,
) -> Result<CsvTable, AppError> {
    let encoding = match encoding {
        Some(label) => source::encoding_by_label(label)?,
        None => source::detect_encoding(path)?,
    };
    let content = source::decode_file(path, encoding)?;
    let separator = match separator {
        Some(sep) => sep,
        None => source::detect_separator(content.lines().next().unwrap_or_default()),
    };
    if !separator.is_ascii() {
        return Err(AppError::InvalidInput(format!(
            "Separator must be a single ASCII character, got {separator:?}"
        )));
    }
    tracing::info!(
        "loading CSV with encoding {} and separator {:?}",
        encoding.name(),
        separator
    );
    let df = parse_csv(&content, separator)?;
    Ok(CsvTable {
        df,
        encoding: encoding.name().to_string(),
        separator,
    })
}

/// Parse CSV text into a DataFrame. The first row is the header; short rows
/// pad with nulls and long rows are truncated to the header width.
pub fn parse_csv(content: &str, separator: char) -> Result<DataFrame, AppError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(separator as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::Parse(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let names = dedup_names(headers.iter());

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::Parse(format!("Failed to parse CSV row {}: {e}", index + 1)))?;
        for (col, column) in columns.iter_mut().enumerate() {
            column.push(cell_value(record.get(col)));
        }
    }

    let series = names
        .iter()
        .zip(&columns)
        .map(|(name, values)| refine::classify_and_coerce(name, values))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataFrame::new(series)?)
}

fn cell_value(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if NULL_MARKERS.contains(&raw.trim()) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Duplicate header names get a numeric suffix so the DataFrame accepts them.
fn dedup_names<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let mut candidate = name.to_string();
        let mut counter = 1;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{name}_{counter}");
            counter += 1;
        }
        out.push(candidate);
    }
    out
}
