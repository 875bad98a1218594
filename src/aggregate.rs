//! Per-status counts and monetary totals over classified rows.

use crate::amount::Amount;
use crate::cell::{AnnotatedRow, CellValue};
use crate::config::ColumnMapping;
use crate::parse::parse_amount;
use crate::status::Status;
use log::warn;
use serde::Serialize;

/// Number of annotated rows returned for on-screen preview.
pub const PREVIEW_ROWS: usize = 100;

/// Aggregate outcome of one processing run.
///
/// # Invariants
///
/// - The five status counts sum to `total_records`
/// - `processed_records == total_records`; rows are reclassified, never dropped
/// - `total_amount_valid + total_amount_removed` equals the sum of every
///   row's parsed amount (unparseable amounts count as zero)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CleansingResult {
    pub total_records: usize,
    pub processed_records: usize,
    pub prescribed_count: usize,
    pub immune_count: usize,
    pub exempt_count: usize,
    pub incomplete_count: usize,
    pub valid_count: usize,
    /// Sum of amounts of every non-valid row.
    pub total_amount_removed: Amount,
    /// Sum of amounts of valid rows.
    pub total_amount_valid: Amount,
}

impl CleansingResult {
    /// Count for one status.
    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Valid => self.valid_count,
            Status::Prescribed => self.prescribed_count,
            Status::Immune => self.immune_count,
            Status::Exempt => self.exempt_count,
            Status::Incomplete => self.incomplete_count,
        }
    }

    /// Rows removed from collection, i.e. every non-valid row.
    pub fn removed_count(&self) -> usize {
        self.total_records - self.valid_count
    }

    /// Sum of all parsed amounts.
    pub fn total_amount(&self) -> Amount {
        self.total_amount_valid + self.total_amount_removed
    }

    fn increment(&mut self, status: Status) {
        let counter = match status {
            Status::Valid => &mut self.valid_count,
            Status::Prescribed => &mut self.prescribed_count,
            Status::Immune => &mut self.immune_count,
            Status::Exempt => &mut self.exempt_count,
            Status::Incomplete => &mut self.incomplete_count,
        };
        *counter += 1;
    }
}

/// Tallies statuses and amounts in a single pass.
///
/// Amounts are re-derived from the mapped amount column. A row whose status
/// cell is missing or unrecognized is skipped for counting and totals, and
/// logged at warn level.
pub fn aggregate(rows: &[AnnotatedRow], mapping: &ColumnMapping) -> CleansingResult {
    let mut result = CleansingResult {
        total_records: rows.len(),
        processed_records: rows.len(),
        ..CleansingResult::default()
    };

    for (idx, row) in rows.iter().enumerate() {
        let Some(status) = row.status() else {
            warn!("Row {}: unrecognized status, not counted", idx + 1);
            continue;
        };
        result.increment(status);

        let amount = parse_amount(row.get(&mapping.amount).unwrap_or(&CellValue::Empty));
        if status.is_valid() {
            result.total_amount_valid += amount;
        } else {
            result.total_amount_removed += amount;
        }
    }

    result
}

/// Everything a processing run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleansingOutcome {
    pub summary: CleansingResult,
    /// First [`PREVIEW_ROWS`] annotated rows.
    pub preview: Vec<AnnotatedRow>,
    /// Full annotated set, kept for export.
    #[serde(skip)]
    pub rows: Vec<AnnotatedRow>,
}

impl CleansingOutcome {
    pub fn new(rows: Vec<AnnotatedRow>, mapping: &ColumnMapping) -> Self {
        let summary = aggregate(&rows, mapping);
        let preview = rows.iter().take(PREVIEW_ROWS).cloned().collect();
        CleansingOutcome {
            summary,
            preview,
            rows,
        }
    }
}
