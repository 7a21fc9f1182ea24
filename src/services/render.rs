//! Rendering of profiles and row samples: Markdown pipe tables, free-text
//! sections, JSON documents, and delimited text.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{CsvTable, QualityFlag, SheetTable, TableProfile};
use crate::services::profiler::is_numeric_dtype;

/// Each bar cell of the missing-value chart covers 5 percentage points.
const MISSING_BAR_CELLS: usize = 20;
const MISSING_PCT_PER_CELL: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
pub enum Align {
    Left,
    Right,
}

/// `1234567` → `"1,234,567"`.
pub fn fmt_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Significant-digit formatting in the style of printf `%g`: scientific
/// notation when the exponent falls outside the precision, trailing zeros
/// trimmed either way.
pub fn fmt_sig(x: f64, sig: usize) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if !x.is_finite() {
        return x.to_string();
    }
    let decimals = sig.saturating_sub(1);
    // round before picking a notation: 99.99 at two digits is 1e+02, not 100
    let formatted = format!("{:.*e}", decimals, x);
    let Some((mantissa, exp_part)) = formatted.split_once('e') else {
        return formatted;
    };
    let exp: i32 = exp_part.parse().unwrap_or(0);
    if exp < -4 || exp >= sig as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exp.abs())
    } else {
        let decimals = (sig as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, x))
    }
}

fn trim_zeros(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}

pub fn fmt_float(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "nan".to_string(),
    }
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    // 719_163 days from 0001-01-01 to the Unix epoch
    NaiveDate::from_num_days_from_ce_opt(days + 719_163)
}

pub(crate) fn datetime_from_parts(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let ms = match unit {
        TimeUnit::Milliseconds => value,
        TimeUnit::Microseconds => value / 1_000,
        TimeUnit::Nanoseconds => value / 1_000_000,
    };
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// A cell as display text. `float_precision` fixes the decimals of floats;
/// `None` renders them naturally. Nulls render empty.
pub fn cell_text(value: &AnyValue, float_precision: Option<usize>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Float64(v) => match float_precision {
            Some(p) => format!("{v:.p$}"),
            None => format!("{v}"),
        },
        AnyValue::Date(days) => date_from_days(*days)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        AnyValue::Datetime(v, unit, _) => datetime_from_parts(*v, *unit)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Markdown pipe table with padded cells, tabulate-style.
pub fn pipe_table(headers: &[String], aligns: &[Align], rows: &[Vec<String>]) -> String {
    let cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(cols) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push('|');
    for (i, header) in headers.iter().enumerate() {
        out.push_str(&format!(" {} |", pad(header, widths[i], Align::Left)));
    }
    out.push('\n');
    out.push('|');
    for (i, width) in widths.iter().enumerate() {
        let align = aligns.get(i).copied().unwrap_or(Align::Left);
        match align {
            Align::Left => out.push_str(&format!(":{}|", "-".repeat(width + 1))),
            Align::Right => out.push_str(&format!("{}:|", "-".repeat(width + 1))),
        }
    }
    for row in rows {
        out.push('\n');
        out.push('|');
        for i in 0..cols {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let align = aligns.get(i).copied().unwrap_or(Align::Left);
            out.push_str(&format!(" {} |", pad(cell, widths[i], align)));
        }
    }
    out
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    let fill = " ".repeat(width.saturating_sub(len));
    match align {
        Align::Left => format!("{text}{fill}"),
        Align::Right => format!("{fill}{text}"),
    }
}

/// Resolve the `--rows`/`--head` pair into a concrete output row count.
/// `--head` wins when given; a rows value of 0 means the whole table.
pub fn resolve_output_rows(total: usize, rows: usize, head: Option<usize>) -> usize {
    let requested = head.unwrap_or(if rows == 0 { total } else { rows });
    requested.min(total)
}

/// The first `n_out` rows as a pipe table, numeric columns right-aligned.
pub fn sample_table(
    df: &DataFrame,
    n_out: usize,
    float_precision: usize,
) -> Result<String, AppError> {
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let aligns: Vec<Align> = df
        .get_columns()
        .iter()
        .map(|s| {
            if is_numeric_dtype(s.dtype()) {
                Align::Right
            } else {
                Align::Left
            }
        })
        .collect();
    let mut rows = Vec::with_capacity(n_out.min(df.height()));
    for i in 0..n_out.min(df.height()) {
        let mut row = Vec::with_capacity(headers.len());
        for series in df.get_columns() {
            row.push(cell_text(&series.get(i)?, Some(float_precision)));
        }
        rows.push(row);
    }
    Ok(pipe_table(&headers, &aligns, &rows))
}

/// The first `n_out` rows re-serialized as comma-delimited text.
pub fn sample_csv(df: &DataFrame, n_out: usize) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(df.get_column_names())?;
    for i in 0..n_out.min(df.height()) {
        let row: Vec<String> = df
            .get_columns()
            .iter()
            .map(|s| Ok(cell_text(&s.get(i)?, None)))
            .collect::<Result<_, AppError>>()?;
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Parse(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Parse(e.to_string()))
}

/// Full CSV-tool profile: overview, numeric stats, dates, categoricals,
/// missing-value chart, quality flags.
pub fn csv_profile(profile: &TableProfile, file_name: &str, file_size_bytes: u64) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("# CSV Profile: {file_name}\n"));
    lines.push(format!(
        "**Dimensions:** {} rows × {} columns",
        fmt_count(profile.rows),
        profile.columns
    ));
    lines.push(format!(
        "**File size:** {:.1} KB\n",
        file_size_bytes as f64 / 1024.0
    ));

    lines.push("## Column Overview\n".to_string());
    let headers = ["Column", "Type", "Non-null", "Null %", "Unique", "Summary"]
        .map(str::to_string)
        .to_vec();
    let aligns = [
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Left,
    ];
    let rows: Vec<Vec<String>> = profile
        .column_profiles
        .iter()
        .map(|col| {
            vec![
                col.name.clone(),
                col.dtype.clone(),
                fmt_count(col.non_null),
                format!("{:.1}%", col.null_pct),
                fmt_count(col.unique),
                col.summary.clone(),
            ]
        })
        .collect();
    lines.push(pipe_table(&headers, &aligns, &rows));
    lines.push(String::new());

    if !profile.numeric.is_empty() {
        lines.push("\n## Numeric Statistics\n".to_string());
        lines.push(numeric_table(profile, "", 3));
        lines.push(String::new());
    }

    if !profile.dates.is_empty() {
        lines.push("\n## Date Ranges\n".to_string());
        for range in &profile.dates {
            lines.push(format!(
                "- **{}:** {} → {} ({} valid)",
                range.name,
                range.min,
                range.max,
                fmt_count(range.valid)
            ));
        }
        lines.push(String::new());
    }

    if !profile.top_values.is_empty() {
        lines.push("\n## Top Values (Categorical)\n".to_string());
        for top in &profile.top_values {
            lines.push(format!("**{}** ({} unique):", top.name, top.unique));
            for entry in &top.values {
                lines.push(format!(
                    "  - `{}`: {} ({:.1}%)",
                    entry.value,
                    fmt_count(entry.count),
                    entry.pct
                ));
            }
        }
        lines.push(String::new());
    }

    if !profile.missing.is_empty() {
        lines.push("\n## Missing Values\n".to_string());
        for col in &profile.missing {
            let filled = ((col.pct / MISSING_PCT_PER_CELL) as usize).min(MISSING_BAR_CELLS);
            let bar = format!(
                "{}{}",
                "█".repeat(filled),
                "░".repeat(MISSING_BAR_CELLS - filled)
            );
            lines.push(format!(
                "  {:<30} {} {:.1}% ({})",
                col.name,
                bar,
                col.pct,
                fmt_count(col.count)
            ));
        }
        lines.push(String::new());
    }

    if profile.flags.is_empty() {
        lines.push("\n## Data Quality\n".to_string());
        lines.push("✅ No obvious quality issues detected.\n".to_string());
    } else {
        lines.push("\n## Data Quality Flags\n".to_string());
        for flag in &profile.flags {
            lines.push(flag_text(flag));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Excel-tool profile: overview with a sample column, numeric stats, dates,
/// missing-value bullets.
pub fn excel_profile(profile: &TableProfile) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("\n## Statistical Profile\n".to_string());
    lines.push(format!(
        "**Dimensions:** {} rows × {} columns\n",
        fmt_count(profile.rows),
        profile.columns
    ));

    lines.push("### Column Overview\n".to_string());
    let headers = ["Column", "Type", "Non-null", "Null %", "Sample"]
        .map(str::to_string)
        .to_vec();
    let aligns = [
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Left,
    ];
    let rows: Vec<Vec<String>> = profile
        .column_profiles
        .iter()
        .map(|col| {
            vec![
                col.name.clone(),
                col.dtype.clone(),
                fmt_count(col.non_null),
                format!("{:.1}%", col.null_pct),
                col.sample.clone().unwrap_or_else(|| "—".to_string()),
            ]
        })
        .collect();
    lines.push(pipe_table(&headers, &aligns, &rows));
    lines.push(String::new());

    if !profile.numeric.is_empty() {
        lines.push("\n### Numeric Statistics\n".to_string());
        lines.push(numeric_table(profile, "Column", 2));
        lines.push(String::new());
    }

    if !profile.dates.is_empty() {
        lines.push("\n### Date Ranges\n".to_string());
        for range in &profile.dates {
            lines.push(format!(
                "- **{}:** {} → {} ({} valid dates)",
                range.name,
                range.min,
                range.max,
                fmt_count(range.valid)
            ));
        }
        lines.push(String::new());
    }

    if !profile.missing.is_empty() {
        lines.push("\n### Missing Values\n".to_string());
        for col in &profile.missing {
            lines.push(format!(
                "- **{}:** {} missing ({:.1}%)",
                col.name,
                fmt_count(col.count),
                col.pct
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn numeric_table(profile: &TableProfile, index_header: &str, precision: usize) -> String {
    let headers = [
        index_header,
        "count",
        "mean",
        "std",
        "min",
        "25%",
        "50%",
        "75%",
        "max",
    ]
    .map(str::to_string)
    .to_vec();
    let mut aligns = vec![Align::Right; headers.len()];
    aligns[0] = Align::Left;
    let rows: Vec<Vec<String>> = profile
        .numeric
        .iter()
        .map(|stats| {
            vec![
                stats.name.clone(),
                fmt_float(Some(stats.count as f64), precision),
                fmt_float(stats.mean, precision),
                fmt_float(stats.std, precision),
                fmt_float(stats.min, precision),
                fmt_float(stats.q25, precision),
                fmt_float(stats.median, precision),
                fmt_float(stats.q75, precision),
                fmt_float(stats.max, precision),
            ]
        })
        .collect();
    pipe_table(&headers, &aligns, &rows)
}

fn flag_text(flag: &QualityFlag) -> String {
    match flag {
        QualityFlag::DuplicateRows(count) => {
            format!("⚠️  **{} duplicate rows** detected", fmt_count(*count))
        }
        QualityFlag::MissingValues { total, columns } => format!(
            "⚠️  **{} total missing values** across {columns} columns",
            fmt_count(*total)
        ),
        QualityFlag::ConstantColumns(names) => format!(
            "⚠️  **Constant columns** (zero variance): {}",
            names.join(", ")
        ),
    }
}

#[derive(Serialize)]
struct CsvDocument {
    file: String,
    encoding: String,
    separator: String,
    total_rows: usize,
    output_rows: usize,
    columns: Vec<String>,
    dtypes: Map<String, Value>,
    data: Vec<Map<String, Value>>,
}

#[derive(Serialize)]
struct SheetDocument {
    file: String,
    sheet: String,
    total_rows: usize,
    output_rows: usize,
    columns: Vec<String>,
    data: Vec<Map<String, Value>>,
}

/// JSON document for the CSV tool: resolved parameters, dimensions, dtypes,
/// and the row sample. 2-space indent, non-ASCII left unescaped.
pub fn csv_json(table: &CsvTable, path: &Path, n_out: usize) -> Result<String, AppError> {
    let df = &table.df;
    let n = n_out.min(df.height());
    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let mut dtypes = Map::new();
    for series in df.get_columns() {
        dtypes.insert(
            series.name().to_string(),
            Value::String(series.dtype().to_string()),
        );
    }
    let document = CsvDocument {
        file: path.display().to_string(),
        encoding: table.encoding.clone(),
        separator: table.separator.to_string(),
        total_rows: df.height(),
        output_rows: n,
        columns,
        dtypes,
        data: json_records(df, n)?,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// JSON document for the Excel tool.
pub fn excel_json(table: &SheetTable, path: &Path, n_out: usize) -> Result<String, AppError> {
    let df = &table.df;
    let n = n_out.min(df.height());
    let document = SheetDocument {
        file: path.display().to_string(),
        sheet: table.sheet_name.clone(),
        total_rows: df.height(),
        output_rows: n,
        columns: df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect(),
        data: json_records(df, n)?,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn json_records(df: &DataFrame, n_out: usize) -> Result<Vec<Map<String, Value>>, AppError> {
    let names = df.get_column_names();
    let mut records = Vec::with_capacity(n_out.min(df.height()));
    for i in 0..n_out.min(df.height()) {
        let mut record = Map::new();
        for (name, series) in names.iter().zip(df.get_columns()) {
            record.insert((*name).to_string(), cell_json(&series.get(i)?));
        }
        records.push(record);
    }
    Ok(records)
}

fn cell_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::Float64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::from(*s),
        AnyValue::StringOwned(s) => Value::from(s.as_str()),
        AnyValue::Date(days) => date_from_days(*days)
            .map(|d| Value::from(d.to_string()))
            .unwrap_or(Value::Null),
        AnyValue::Datetime(v, unit, _) => datetime_from_parts(*v, *unit)
            .map(|dt| Value::from(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        other => Value::from(other.to_string()),
    }
}
