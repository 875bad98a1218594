//! Classification status of a debt record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of classifying one row. Exactly one per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    /// Matched no rule; the debt stays collectible.
    Valid,

    /// Due date is older than the statute-of-limitations cutoff.
    Prescribed,

    /// Taxpayer name identifies a legally immune entity.
    Immune,

    /// Amount below threshold or tribute in the exempt list.
    Exempt,

    /// Taxpayer name or document too degraded to act upon.
    Incomplete,
}

impl Status {
    /// All statuses, in report order.
    pub const ALL: [Status; 5] = [
        Status::Valid,
        Status::Prescribed,
        Status::Immune,
        Status::Exempt,
        Status::Incomplete,
    ];

    /// Display label written to the status column.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Valid => "Válido",
            Status::Prescribed => "Prescrito",
            Status::Immune => "Imune",
            Status::Exempt => "Isento",
            Status::Incomplete => "Dados Incompletos",
        }
    }

    /// Inverse of [`Status::label`]. Surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Option<Status> {
        let label = label.trim();
        Status::ALL.into_iter().find(|s| s.label() == label)
    }

    /// `true` only for [`Status::Valid`]; every other status removes the
    /// row from collection.
    pub fn is_valid(&self) -> bool {
        matches!(self, Status::Valid)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
