//! Spreadsheet input: header analysis and row loading for CSV files and
//! Excel/OpenDocument workbooks.
//!
//! Brazilian CSV exports are often `;`-separated, since `,` is the decimal
//! mark. The delimiter is picked from the header line. Workbooks are read
//! from their first sheet, with the first row as header.

use crate::cell::{CellValue, Row};
use crate::error::{CleanserError, Result};
use crate::parse::date_from_serial;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Input layouts the reader understands, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Workbook,
}

impl Format {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "csv" => Some(Format::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Format::Workbook),
            _ => None,
        }
    }
}

/// Picks `;` when the header line has more semicolons than commas.
pub fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or_default();
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn check_extension(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    Format::from_extension(&ext)
        .ok_or_else(|| CleanserError::UnsupportedFormat(path.display().to_string()))
}

/// Reads a CSV file as UTF-8, falling back to Windows-1252 (the usual
/// encoding of Excel CSV exports on Brazilian Windows machines).
fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            decoded.into_owned()
        }
    };
    // Excel adds a BOM to UTF-8 CSV exports.
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(detect_delimiter(content))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes())
}

/// Column names of the input file, for building a mapping.
pub fn read_headers<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    match check_extension(path)? {
        Format::Csv => headers_from_str(&read_file(path)?),
        Format::Workbook => Ok(read_sheet(path)?.0),
    }
}

/// Column names of CSV text.
pub fn headers_from_str(content: &str) -> Result<Vec<String>> {
    let mut reader = csv_reader(content);
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Loads every data row of the input file.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    let path = path.as_ref();
    match check_extension(path)? {
        Format::Csv => rows_from_str(&read_file(path)?),
        Format::Workbook => Ok(read_sheet(path)?.1),
    }
}

/// Loads every data row of CSV text.
///
/// Blank cells become [`CellValue::Empty`], all others text. Short records
/// are padded with empty cells; extra trailing fields are dropped.
pub fn rows_from_str(content: &str) -> Result<Vec<Row>> {
    let mut reader = csv_reader(content);
    let headers: StringRecord = reader.headers()?.clone();
    let mut rows = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row
        let record = result?;

        if record.len() > headers.len() {
            warn!(
                "Row {}: {} fields for {} columns, extra fields dropped",
                row_num,
                record.len(),
                headers.len()
            );
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let cell = match record.get(i) {
                    Some(value) if !value.is_empty() => CellValue::Text(value.to_string()),
                    _ => CellValue::Empty,
                };
                (column.to_string(), cell)
            })
            .collect();
        rows.push(row);
    }

    debug!("Read {} rows with {} columns", rows.len(), headers.len());
    Ok(rows)
}

/// Converts one workbook cell. Booleans become `TRUE`/`FALSE` text and
/// error cells (`#N/A`, `#DIV/0!`) become empty.
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.trim().to_string()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // The 1904 flag is not exposed, so serials assume the 1900 system.
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            date_from_serial(serial)
                .map(CellValue::Date)
                .unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Header and data rows of the first sheet of a workbook. Fully blank
/// rows are skipped.
fn read_sheet(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let mut workbook = open_workbook_auto(path)?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        warn!("{} has no sheets", path.display());
        return Ok((Vec::new(), Vec::new()));
    };
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_from_data(cell).to_string())
            .collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let mut rows = Vec::new();
    for data in sheet_rows {
        let cells: Vec<CellValue> = data.iter().map(cell_from_data).collect();
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        let row: Row = headers
            .iter()
            .cloned()
            .zip(cells.into_iter().chain(std::iter::repeat(CellValue::Empty)))
            .collect();
        rows.push(row);
    }

    debug!(
        "Read {} rows with {} columns from sheet '{}'",
        rows.len(),
        headers.len(),
        sheet_name
    );
    Ok((headers, rows))
}
