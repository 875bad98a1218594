//! # Debt Cleanser
//!
//! Classifies tax-debt (dívida ativa) records loaded from a spreadsheet and
//! summarizes which of them remain collectible.
//!
//! ## Design Principles
//!
//! - **Ordered rules**: prescription, immunity, exemption, incomplete; the
//!   first match decides the row
//! - **Lenient cells**: malformed dates and amounts degrade, never abort
//! - **Fail fast on configuration**: missing required columns stop the run
//!   before any row is classified
//! - **Exact money**: amounts are fixed-point via `rust_decimal`
//!
//! ## Example
//!
//! ```no_run
//! use debt_cleanser::{reader, CleansingConfig, Cleanser};
//!
//! let config = CleansingConfig::from_path("config.json").unwrap();
//! let rows = reader::read_rows("divida.csv").unwrap();
//! let outcome = Cleanser::new(config).unwrap().process(&rows).unwrap();
//! println!("{} valid records", outcome.summary.valid_count);
//! ```

pub mod aggregate;
pub mod amount;
pub mod cell;
pub mod config;
pub mod error;
pub mod export;
pub mod parse;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod rules;
pub mod status;

pub use aggregate::{aggregate, CleansingOutcome, CleansingResult};
pub use amount::Amount;
pub use cell::{AnnotatedRow, CellValue, Row};
pub use config::{
    CleansingConfig, ColumnMapping, ExemptionRules, ImmunityRules, IncompleteRules,
    PrescriptionRules,
};
pub use error::{CleanserError, Result};
pub use parse::{parse_amount, parse_date};
pub use pipeline::{Cleanser, NoProgress, Progress};
pub use rules::{Cutoff, Rule, RuleSet, RowFields, Verdict};
pub use status::Status;
