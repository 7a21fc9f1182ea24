//! Source resolution: figure out the concrete parameters needed to load a
//! file before any parsing happens (encoding, delimiter, sheet).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::AppError;

/// How many bytes to sample when sniffing the encoding.
pub const ENCODING_SAMPLE_BYTES: usize = 64 * 1024;

/// Delimiter candidates, in tie-break order.
pub const SEPARATOR_CANDIDATES: [char; 4] = [',', '\t', ';', '|'];

/// Sniff the encoding from the first 64 KB: a BOM wins, otherwise valid
/// UTF-8 is assumed UTF-8, anything else falls back to windows-1252.
pub fn detect_encoding(path: &Path) -> Result<&'static Encoding, AppError> {
    let mut sample = Vec::with_capacity(ENCODING_SAMPLE_BYTES);
    File::open(path)?
        .take(ENCODING_SAMPLE_BYTES as u64)
        .read_to_end(&mut sample)?;
    Ok(sniff_encoding(&sample))
}

pub fn sniff_encoding(sample: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return encoding;
    }
    if std::str::from_utf8(sample).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

pub fn encoding_by_label(label: &str) -> Result<&'static Encoding, AppError> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown encoding: {label}")))
}

/// Read and decode a whole file. Undecodable bytes are replaced rather than
/// surfaced as errors.
pub fn decode_file(path: &Path, encoding: &'static Encoding) -> Result<String, AppError> {
    let bytes = std::fs::read(path)?;
    let (text, _, _) = encoding.decode(&bytes);
    Ok(text.into_owned())
}

/// Pick whichever candidate delimiter occurs most often in the first line.
/// Ties go to the earlier candidate. Quoted fields containing a candidate
/// character can fool this; explicit `--sep` is the escape hatch.
pub fn detect_separator(first_line: &str) -> char {
    let mut best = SEPARATOR_CANDIDATES[0];
    let mut best_count = first_line.matches(best).count();
    for &candidate in &SEPARATOR_CANDIDATES[1..] {
        let count = first_line.matches(candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Resolve a sheet selector against the workbook's sheet list. `None` means
/// the first sheet; an all-digits selector is a zero-based index; anything
/// else must match a sheet name exactly.
pub fn resolve_sheet(selector: Option<&str>, sheet_names: &[String]) -> Result<String, AppError> {
    let Some(first) = sheet_names.first() else {
        return Err(AppError::FileProcessing(
            "No sheets found in workbook".to_string(),
        ));
    };
    match selector {
        None => Ok(first.clone()),
        Some(sel) if !sel.is_empty() && sel.chars().all(|c| c.is_ascii_digit()) => {
            let index: usize = sel
                .parse()
                .map_err(|_| AppError::InvalidInput(format!("Invalid sheet index: {sel}")))?;
            sheet_names.get(index).cloned().ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Sheet index {index} out of range ({} sheets)",
                    sheet_names.len()
                ))
            })
        }
        Some(sel) => {
            if sheet_names.iter().any(|name| name == sel) {
                Ok(sel.to_string())
            } else {
                Err(AppError::InvalidInput(format!("Sheet not found: {sel}")))
            }
        }
    }
}
