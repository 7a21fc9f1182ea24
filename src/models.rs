use chrono::NaiveDate;
use polars::frame::DataFrame;
use smallvec::SmallVec;

/// A loaded CSV file together with the parameters the resolver settled on.
#[derive(Debug)]
pub struct CsvTable {
    pub df: DataFrame,
    pub encoding: String,
    pub separator: char,
}

/// A single materialized Excel sheet.
#[derive(Debug)]
pub struct SheetTable {
    pub df: DataFrame,
    pub sheet_name: String,
}

/// Dimensions of one sheet, reported without materializing its rows.
/// `rows` excludes the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDims {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

/// Per-column summary: type, cardinality, nullness, and a short
/// type-specific description.
#[derive(Debug)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub null_count: usize,
    pub null_pct: f64,
    pub unique: usize,
    /// numeric: min/mean/max; date: range; text: top values
    pub summary: String,
    /// first non-null value, for the Excel-style overview
    pub sample: Option<String>,
}

/// describe()-style statistics for one numeric column.
#[derive(Debug)]
pub struct NumericStats {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug)]
pub struct DateRange {
    pub name: String,
    pub min: NaiveDate,
    pub max: NaiveDate,
    pub valid: usize,
}

pub const TOP_VALUE_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
    pub pct: f64,
}

/// Most frequent values of one text column.
#[derive(Debug)]
pub struct TopValues {
    pub name: String,
    pub unique: usize,
    pub values: SmallVec<[TopValue; TOP_VALUE_COUNT]>,
}

#[derive(Debug)]
pub struct MissingColumn {
    pub name: String,
    pub count: usize,
    pub pct: f64,
}

/// A detected whole-table data issue.
#[derive(Debug, PartialEq)]
pub enum QualityFlag {
    DuplicateRows(usize),
    MissingValues { total: usize, columns: usize },
    ConstantColumns(Vec<String>),
}

/// The full derived profile of a table. Computed fresh each run, never stored.
#[derive(Debug)]
pub struct TableProfile {
    pub rows: usize,
    pub columns: usize,
    pub column_profiles: Vec<ColumnProfile>,
    pub numeric: Vec<NumericStats>,
    pub dates: Vec<DateRange>,
    pub top_values: Vec<TopValues>,
    pub missing: Vec<MissingColumn>,
    pub flags: Vec<QualityFlag>,
}
