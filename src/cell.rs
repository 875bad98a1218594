//! Row and cell models for loosely-typed spreadsheet input.

use crate::status::Status;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Column added to every annotated row holding the status label.
pub const STATUS_COLUMN: &str = "Status_Higienizacao";

/// Column added to every annotated row holding the human-readable reason.
pub const REASON_COLUMN: &str = "Motivo_Higienizacao";

/// Raw cell value as handed over by the spreadsheet reader.
///
/// A column may hold numbers, strings or dates interchangeably, so every
/// parser pattern-matches on this closed set instead of coercing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty or null cell
    #[default]
    Empty,

    /// Numeric cell (integers arrive as whole floats)
    Number(f64),

    /// Text cell, untrimmed
    Text(String),

    /// Native date cell
    Date(NaiveDate),
}

impl CellValue {
    /// Returns `true` for empty cells and blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    /// Renders the cell the way a user reading the sheet would type it.
    ///
    /// Whole numbers print without a fractional part so that numeric
    /// document ids and tribute codes keep their digits intact.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Empty => serializer.serialize_str(""),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// One input record: column name to raw cell, in sheet column order.
pub type Row = IndexMap<String, CellValue>;

/// Builds a row from `(column, value)` pairs.
pub fn row<K, V, I>(cells: I) -> Row
where
    K: Into<String>,
    V: Into<CellValue>,
    I: IntoIterator<Item = (K, V)>,
{
    cells
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A classified row: the original cells plus the status and reason columns.
///
/// The input row is never mutated; this is a fresh copy. Status is kept as
/// its display label in [`STATUS_COLUMN`] so that exported rows and rows
/// read back from an export look the same to the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnnotatedRow {
    fields: Row,
}

impl AnnotatedRow {
    /// Copies `row` and appends the status and reason columns.
    pub fn new(row: &Row, status: Status, reason: &str) -> Self {
        let mut fields = row.clone();
        fields.insert(STATUS_COLUMN.to_string(), status.label().into());
        fields.insert(REASON_COLUMN.to_string(), reason.into());
        AnnotatedRow { fields }
    }

    /// Wraps a row that already carries the status and reason columns.
    pub fn from_fields(fields: Row) -> Self {
        AnnotatedRow { fields }
    }

    /// All cells, including the two added columns.
    pub fn fields(&self) -> &Row {
        &self.fields
    }

    /// Looks up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    /// Parsed status, or `None` if the status cell is missing or unrecognized.
    pub fn status(&self) -> Option<Status> {
        match self.fields.get(STATUS_COLUMN)? {
            CellValue::Text(label) => Status::from_label(label),
            _ => None,
        }
    }

    /// The reason text; empty for valid rows.
    pub fn reason(&self) -> String {
        self.fields
            .get(REASON_COLUMN)
            .map(|c| c.to_string())
            .unwrap_or_default()
    }

    /// The original cells, without the two added columns.
    pub fn original(&self) -> Row {
        self.fields
            .iter()
            .filter(|(k, _)| k.as_str() != STATUS_COLUMN && k.as_str() != REASON_COLUMN)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
