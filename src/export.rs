//! Export of the annotated rows as a set of CSV sections.
//!
//! One file per section, mirroring the sheets of the cleansing workbook:
//! every row, the immune and exempt rows, the prescribed rows, the
//! incomplete rows, the valid rows, and a per-year summary of amounts.

use crate::amount::Amount;
use crate::cell::{AnnotatedRow, CellValue};
use crate::config::ColumnMapping;
use crate::error::Result;
use crate::parse::{parse_amount, parse_date, parse_year};
use crate::status::Status;
use chrono::Datelike;
use log::info;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Year bucket for rows with neither a tax year nor a parseable due date.
pub const NO_YEAR: &str = "N/A";

/// File name of the per-year summary section.
pub const SUMMARY_FILE: &str = "resumo_por_ano.csv";

/// Row sections of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    All,
    ImmuneExempt,
    Prescribed,
    Incomplete,
    Valid,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::All,
        Section::ImmuneExempt,
        Section::Prescribed,
        Section::Incomplete,
        Section::Valid,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Section::All => "todos.csv",
            Section::ImmuneExempt => "imunes_isentos.csv",
            Section::Prescribed => "prescritos.csv",
            Section::Incomplete => "incompletos.csv",
            Section::Valid => "validos.csv",
        }
    }

    /// Whether a row belongs here. Rows with an unrecognized status only
    /// appear in [`Section::All`].
    pub fn includes(&self, row: &AnnotatedRow) -> bool {
        match self {
            Section::All => true,
            Section::ImmuneExempt => {
                matches!(row.status(), Some(Status::Immune | Status::Exempt))
            }
            Section::Prescribed => row.status() == Some(Status::Prescribed),
            Section::Incomplete => row.status() == Some(Status::Incomplete),
            Section::Valid => row.status() == Some(Status::Valid),
        }
    }
}

/// Column header shared by all row sections, in first-seen order.
pub fn header(rows: &[AnnotatedRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.fields().keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Writes the rows of one section as CSV under `header`.
pub fn write_section<W: Write>(
    section: Section,
    header: &[String],
    rows: &[AnnotatedRow],
    writer: W,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header)?;

    let mut written = 0;
    for row in rows.iter().filter(|r| section.includes(r)) {
        csv_writer.write_record(
            header
                .iter()
                .map(|column| row.get(column).map(|c| c.to_string()).unwrap_or_default()),
        )?;
        written += 1;
    }

    csv_writer.flush()?;
    Ok(written)
}

/// Amount totals per year and status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearSummary {
    years: BTreeMap<String, BTreeMap<Status, Amount>>,
}

impl YearSummary {
    /// Groups row amounts by year and status.
    ///
    /// The year comes from the `tax_year` column when mapped and filled,
    /// else from the parsed due date, else the [`NO_YEAR`] bucket.
    pub fn from_rows(rows: &[AnnotatedRow], mapping: &ColumnMapping) -> Self {
        let mut summary = YearSummary::default();
        for row in rows {
            let Some(status) = row.status() else {
                continue;
            };
            let amount = parse_amount(row.get(&mapping.amount).unwrap_or(&CellValue::Empty));
            *summary
                .years
                .entry(year_of(row, mapping))
                .or_default()
                .entry(status)
                .or_default() += amount;
        }
        summary
    }

    /// Total for one year and status, zero when absent.
    pub fn amount(&self, year: &str, status: Status) -> Amount {
        self.years
            .get(year)
            .and_then(|by_status| by_status.get(&status))
            .copied()
            .unwrap_or_default()
    }

    /// Years in ascending order; [`NO_YEAR`] sorts last.
    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.years.keys().map(String::as_str)
    }

    /// Writes one line per year: each status total and the row total, as currency.
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut heading = vec!["Ano".to_string()];
        heading.extend(Status::ALL.iter().map(|s| s.label().to_string()));
        heading.push("Total".to_string());
        csv_writer.write_record(&heading)?;

        for (year, by_status) in &self.years {
            let mut record = vec![year.clone()];
            record.extend(
                Status::ALL
                    .iter()
                    .map(|s| by_status.get(s).copied().unwrap_or_default().to_brl()),
            );
            let total: Amount = by_status.values().copied().sum();
            record.push(total.to_brl());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn year_of(row: &AnnotatedRow, mapping: &ColumnMapping) -> String {
    if let Some(cell) = mapping.tax_year().and_then(|c| row.get(c)) {
        if let Some(year) = parse_year(cell) {
            return year.to_string();
        }
        if !cell.is_blank() {
            return cell.to_string().trim().to_string();
        }
    }

    row.get(&mapping.due_date)
        .and_then(parse_date)
        .map(|d| d.year().to_string())
        .unwrap_or_else(|| NO_YEAR.to_string())
}

/// Writes every section into `dir`, creating it if needed.
///
/// Returns the paths written, row sections first.
pub fn export_to_dir<P: AsRef<Path>>(
    rows: &[AnnotatedRow],
    mapping: &ColumnMapping,
    dir: P,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let header = header(rows);
    let mut paths = Vec::with_capacity(Section::ALL.len() + 1);

    for section in Section::ALL {
        let path = dir.join(section.file_name());
        let written = write_section(section, &header, rows, BufWriter::new(File::create(&path)?))?;
        info!("Wrote {} rows to {}", written, path.display());
        paths.push(path);
    }

    let path = dir.join(SUMMARY_FILE);
    YearSummary::from_rows(rows, mapping).write(BufWriter::new(File::create(&path)?))?;
    info!("Wrote yearly summary to {}", path.display());
    paths.push(path);

    Ok(paths)
}
