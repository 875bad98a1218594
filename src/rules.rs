//! Eligibility rules and the ordered, short-circuiting classifier.
//!
//! Each rule is a pure function of the derived row fields and the compiled
//! configuration. Rules run in [`Rule::ORDER`]; the first one that returns a
//! verdict decides the row, and a row no rule claims is valid.

use crate::amount::Amount;
use crate::cell::{CellValue, Row};
use crate::config::{CleansingConfig, ColumnMapping};
use crate::parse::{digits_only, normalize_name, normalize_tribute, parse_amount, parse_date};
use crate::status::Status;
use chrono::{Local, Months, NaiveDate};

/// Names shorter than this many characters count as incomplete.
const MIN_NAME_CHARS: usize = 3;

static EMPTY: CellValue = CellValue::Empty;

fn cell<'r>(row: &'r Row, column: &str) -> &'r CellValue {
    row.get(column).unwrap_or(&EMPTY)
}

/// Values derived from one row before any rule runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFields {
    pub due_date: Option<NaiveDate>,
    pub amount: Amount,
    /// Trimmed, uppercased taxpayer name.
    pub name: String,
    /// Digits of the CPF/CNPJ; `None` when no document column is mapped.
    pub document: Option<String>,
    /// Uppercased tribute type; empty when not mapped.
    pub tribute: String,
}

impl RowFields {
    /// Derives the normalized fields of `row` under `mapping`.
    ///
    /// Missing cells read as empty, so unmapped optional fields never
    /// trigger their rules.
    pub fn derive(row: &Row, mapping: &ColumnMapping) -> Self {
        RowFields {
            due_date: parse_date(cell(row, &mapping.due_date)),
            amount: parse_amount(cell(row, &mapping.amount)),
            name: normalize_name(cell(row, &mapping.taxpayer_name)),
            document: mapping.cpf_cnpj().map(|c| digits_only(cell(row, c))),
            tribute: mapping
                .tribute_type()
                .map(|c| normalize_tribute(cell(row, c)))
                .unwrap_or_default(),
        }
    }
}

/// Status plus the human-readable reason for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: Status,
    /// Empty for valid rows.
    pub reason: String,
}

impl Verdict {
    pub fn valid() -> Self {
        Verdict {
            status: Status::Valid,
            reason: String::new(),
        }
    }

    fn new(status: Status, reason: impl Into<String>) -> Self {
        Verdict {
            status,
            reason: reason.into(),
        }
    }
}

/// The four rule families, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Prescription,
    Immunity,
    Exemption,
    Incomplete,
}

impl Rule {
    /// Evaluation order. Earlier rules shadow later ones.
    pub const ORDER: [Rule; 4] = [
        Rule::Prescription,
        Rule::Immunity,
        Rule::Exemption,
        Rule::Incomplete,
    ];

    /// Applies this rule to one row. `None` means the rule does not claim it,
    /// including when the rule is disabled.
    pub fn evaluate(self, fields: &RowFields, rules: &RuleSet) -> Option<Verdict> {
        match self {
            Rule::Prescription => {
                let cutoff = rules.cutoff?;
                // An unknown due date cannot prove staleness.
                let due = fields.due_date?;
                cutoff.precedes(due).then(|| {
                    Verdict::new(
                        Status::Prescribed,
                        format!("Vencimento anterior a {}", cutoff.date.format("%d/%m/%Y")),
                    )
                })
            }
            Rule::Immunity => {
                let keywords = rules.immunity_keywords.as_ref()?;
                contains_any(&fields.name, keywords).then(|| {
                    Verdict::new(
                        Status::Immune,
                        "Entidade Imune identificada por palavra-chave",
                    )
                })
            }
            Rule::Exemption => {
                let exemption = rules.exemption.as_ref()?;
                let by_amount = exemption.amount_threshold.is_positive()
                    && fields.amount < exemption.amount_threshold;
                let by_tribute = !fields.tribute.is_empty()
                    && exemption.tributes.iter().any(|t| *t == fields.tribute);

                // The tribute check runs second, so its reason wins when both hold.
                if by_tribute {
                    Some(Verdict::new(Status::Exempt, "Tributo Isento"))
                } else if by_amount {
                    Some(Verdict::new(
                        Status::Exempt,
                        format!(
                            "Valor abaixo de {}",
                            exemption.amount_threshold.to_brl()
                        ),
                    ))
                } else {
                    None
                }
            }
            Rule::Incomplete => {
                let incomplete = rules.incomplete.as_ref()?;
                let bad_name = contains_any(&fields.name, &incomplete.keywords)
                    || fields.name.chars().count() < MIN_NAME_CHARS;
                let bad_document = incomplete.check_cpf_cnpj
                    && fields.document.as_deref().is_some_and(str::is_empty);

                (bad_name || bad_document).then(|| {
                    Verdict::new(Status::Incomplete, "Nome ou CPF/CNPJ inválido/genérico")
                })
            }
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExemption {
    pub amount_threshold: Amount,
    /// Uppercased tribute codes.
    pub tributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledIncomplete {
    /// Uppercased placeholder-name keywords.
    pub keywords: Vec<String>,
    pub check_cpf_cnpj: bool,
}

/// Prescription boundary.
///
/// A configured reference date is a whole day, so a debt due exactly on the
/// cutoff day survives. Without one the reference is the current instant,
/// and midnight of the cutoff day already lies behind it: the cutoff day
/// itself is prescribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    pub date: NaiveDate,
    pub inclusive: bool,
}

impl Cutoff {
    /// `true` when a debt due on `due` is past the statute of limitations.
    pub fn precedes(&self, due: NaiveDate) -> bool {
        due < self.date || (self.inclusive && due == self.date)
    }
}

/// Rule configuration compiled once per run.
///
/// Disabled rules are `None`. Keywords and tribute codes are uppercased here
/// and blank entries dropped, so per-row matching is a plain substring or
/// equality test.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub cutoff: Option<Cutoff>,
    pub immunity_keywords: Option<Vec<String>>,
    pub exemption: Option<CompiledExemption>,
    pub incomplete: Option<CompiledIncomplete>,
}

impl RuleSet {
    /// Compiles `config`, counting prescription back from today when no
    /// reference date is configured.
    pub fn new(config: &CleansingConfig) -> Self {
        Self::with_today(config, Local::now().date_naive())
    }

    /// Compiles `config` with an explicit "today".
    pub fn with_today(config: &CleansingConfig, today: NaiveDate) -> Self {
        let prescription = &config.prescription;
        let cutoff = if prescription.enabled {
            let reference = prescription.reference_date.unwrap_or(today);
            prescription_cutoff(reference, prescription.years).map(|date| Cutoff {
                date,
                inclusive: prescription.reference_date.is_none(),
            })
        } else {
            None
        };

        RuleSet {
            cutoff,
            immunity_keywords: config
                .immunity
                .enabled
                .then(|| uppercase_all(&config.immunity.keywords)),
            exemption: config.exemption.enabled.then(|| CompiledExemption {
                amount_threshold: config.exemption.amount_threshold,
                tributes: uppercase_all(&config.exemption.tributes),
            }),
            incomplete: config.incomplete.enabled.then(|| CompiledIncomplete {
                keywords: uppercase_all(&config.incomplete.keywords),
                check_cpf_cnpj: config.incomplete.check_cpf_cnpj,
            }),
        }
    }

    /// Classifies derived fields: first matching rule wins, else valid.
    pub fn evaluate(&self, fields: &RowFields) -> Verdict {
        Rule::ORDER
            .iter()
            .find_map(|rule| rule.evaluate(fields, self))
            .unwrap_or_else(Verdict::valid)
    }

    /// Derives the fields of `row` and classifies it.
    pub fn classify(&self, row: &Row, mapping: &ColumnMapping) -> Verdict {
        self.evaluate(&RowFields::derive(row, mapping))
    }
}

/// `reference` minus `years` calendar years. Feb 29 clamps to Feb 28.
pub fn prescription_cutoff(reference: NaiveDate, years: u32) -> Option<NaiveDate> {
    reference.checked_sub_months(Months::new(years.checked_mul(12)?))
}

fn uppercase_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_uppercase())
        .collect()
}
