//! Classification pipeline: validate the schema, classify every row once,
//! then aggregate.
//!
//! The only fatal failure is a required column missing from the schema,
//! detected before any row is touched. Everything per-row degrades.

use crate::aggregate::CleansingOutcome;
use crate::cell::{AnnotatedRow, Row};
use crate::config::{CleansingConfig, ColumnMapping};
use crate::error::Result;
use crate::rules::{RuleSet, Verdict};
use chrono::NaiveDate;
use log::{debug, info, warn};

/// Receives advisory progress updates: a percentage and a phase phrase.
///
/// Percentages only grow. 0-10 covers setup, 10-90 the row loop and
/// 90-100 aggregation.
pub trait Progress {
    fn report(&mut self, percent: u8, phase: &str);
}

impl<F: FnMut(u8, &str)> Progress for F {
    fn report(&mut self, percent: u8, phase: &str) {
        self(percent, phase)
    }
}

/// Discards progress updates, for headless and batch runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _percent: u8, _phase: &str) {}
}

/// Applies one configuration to row sequences.
///
/// Holds no state between runs; each call to [`Cleanser::process`] works
/// only on the rows it is given.
#[derive(Debug, Clone)]
pub struct Cleanser {
    config: CleansingConfig,
    rules: RuleSet,
}

impl Cleanser {
    /// Validates `config` and compiles its rules against today's date.
    pub fn new(config: CleansingConfig) -> Result<Self> {
        config.validate()?;
        let rules = RuleSet::new(&config);
        Ok(Cleanser { config, rules })
    }

    /// Like [`Cleanser::new`] with an explicit "today" for prescription.
    pub fn with_today(config: CleansingConfig, today: NaiveDate) -> Result<Self> {
        config.validate()?;
        let rules = RuleSet::with_today(&config, today);
        Ok(Cleanser { config, rules })
    }

    pub fn config(&self) -> &CleansingConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classifies a single row under the configured mapping.
    pub fn classify(&self, row: &Row) -> Verdict {
        self.rules.classify(row, &self.config.mapping)
    }

    /// Processes `rows` without progress reporting.
    pub fn process(&self, rows: &[Row]) -> Result<CleansingOutcome> {
        self.process_with_progress(rows, &mut NoProgress)
    }

    /// Processes `rows`, reporting progress roughly every tenth of the input.
    ///
    /// Fails with `MissingColumns` before classifying anything if the first
    /// row lacks a required column.
    pub fn process_with_progress(
        &self,
        rows: &[Row],
        progress: &mut dyn Progress,
    ) -> Result<CleansingOutcome> {
        progress.report(0, "Validando colunas");
        let mapping = self.effective_mapping(rows)?;

        let total = rows.len();
        info!("Classifying {} records", total);
        progress.report(10, "Classificando registros");

        let step = total.div_ceil(10).max(1);
        let mut annotated = Vec::with_capacity(total);

        for (idx, row) in rows.iter().enumerate() {
            let verdict = self.rules.classify(row, &mapping);
            if !verdict.status.is_valid() {
                debug!("Row {}: {} ({})", idx + 1, verdict.status, verdict.reason);
            }
            annotated.push(AnnotatedRow::new(row, verdict.status, &verdict.reason));

            let done = idx + 1;
            if done % step == 0 && done < total {
                let percent = 10 + (80 * done / total) as u8;
                progress.report(percent, &format!("Classificando registros ({}/{})", done, total));
            }
        }

        progress.report(90, "Calculando resumo");
        let outcome = CleansingOutcome::new(annotated, &mapping);
        let summary = &outcome.summary;
        info!(
            "Processed {} records: {} valid, {} prescribed, {} immune, {} exempt, {} incomplete",
            summary.total_records,
            summary.valid_count,
            summary.prescribed_count,
            summary.immune_count,
            summary.exempt_count,
            summary.incomplete_count
        );
        progress.report(100, "Concluído");

        Ok(outcome)
    }

    /// Checks required columns against the first row's keys and drops
    /// optional columns the schema does not have.
    fn effective_mapping(&self, rows: &[Row]) -> Result<ColumnMapping> {
        let mut mapping = self.config.mapping.clone();
        let Some(first) = rows.first() else {
            info!("No rows to process");
            return Ok(mapping);
        };

        mapping.validate(first.keys().map(String::as_str))?;

        for (field, column) in self.config.mapping.optional() {
            if first.contains_key(column) {
                continue;
            }
            warn!(
                "Optional field {} mapped to absent column '{}', treating as unmapped",
                field, column
            );
            match field {
                "cpf_cnpj" => mapping.cpf_cnpj = None,
                "tribute_type" => mapping.tribute_type = None,
                _ => mapping.tax_year = None,
            }
        }

        Ok(mapping)
    }
}
