//! Processing configuration: column mapping and the four rule families.
//!
//! Deserialized from JSON. Every rule section and field is optional and
//! falls back to the defaults used by municipal debt-cleansing runs.

use crate::amount::Amount;
use crate::error::{CleanserError, Result};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Maps logical fields to column names in the input sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub debt_id: String,
    pub taxpayer_name: String,
    pub due_date: String,
    pub amount: String,
    #[serde(default)]
    pub cpf_cnpj: Option<String>,
    #[serde(default)]
    pub tribute_type: Option<String>,
    #[serde(default)]
    pub tax_year: Option<String>,
}

impl ColumnMapping {
    /// Required `(logical field, column)` pairs, in validation order.
    pub fn required(&self) -> [(&'static str, &str); 4] {
        [
            ("debt_id", self.debt_id.as_str()),
            ("taxpayer_name", self.taxpayer_name.as_str()),
            ("due_date", self.due_date.as_str()),
            ("amount", self.amount.as_str()),
        ]
    }

    /// Optional `(logical field, column)` pairs that are actually set.
    pub fn optional(&self) -> Vec<(&'static str, &str)> {
        [
            ("cpf_cnpj", self.cpf_cnpj()),
            ("tribute_type", self.tribute_type()),
            ("tax_year", self.tax_year()),
        ]
        .into_iter()
        .filter_map(|(field, column)| column.map(|c| (field, c)))
        .collect()
    }

    pub fn cpf_cnpj(&self) -> Option<&str> {
        non_blank(&self.cpf_cnpj)
    }

    pub fn tribute_type(&self) -> Option<&str> {
        non_blank(&self.tribute_type)
    }

    pub fn tax_year(&self) -> Option<&str> {
        non_blank(&self.tax_year)
    }

    /// Required columns absent from `schema`, in required-field order.
    pub fn missing_columns<'a, I>(&self, schema: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: HashSet<&str> = schema.into_iter().collect();
        self.required()
            .iter()
            .filter(|(_, column)| !present.contains(column))
            .map(|(_, column)| column.to_string())
            .collect()
    }

    /// Fails with [`CleanserError::MissingColumns`] if any required column is absent.
    pub fn validate<'a, I>(&self, schema: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing = self.missing_columns(schema);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CleanserError::MissingColumns { columns: missing })
        }
    }
}

/// Frontends send `""` for "not mapped".
fn non_blank(column: &Option<String>) -> Option<&str> {
    column.as_deref().filter(|c| !c.trim().is_empty())
}

/// Statute-of-limitations rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrescriptionRules {
    pub enabled: bool,
    /// Debts due more than this many years before the reference date are prescribed.
    pub years: u32,
    /// Date to count back from; today when absent.
    pub reference_date: Option<NaiveDate>,
}

impl Default for PrescriptionRules {
    fn default() -> Self {
        PrescriptionRules {
            enabled: true,
            years: 5,
            reference_date: None,
        }
    }
}

/// Legal immunity by taxpayer-name keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImmunityRules {
    pub enabled: bool,
    pub keywords: Vec<String>,
}

impl Default for ImmunityRules {
    fn default() -> Self {
        ImmunityRules {
            enabled: true,
            keywords: strings(&[
                "UNIÃO",
                "ESTADO",
                "MUNICIPIO",
                "TEMPLO",
                "PARTIDO",
                "SINDICATO",
                "AUTARQUIA",
                "FUNDAÇÃO",
            ]),
        }
    }
}

/// Exemption by amount threshold or tribute type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExemptionRules {
    pub enabled: bool,
    /// Amounts strictly below this are exempt. Zero disables the check.
    pub amount_threshold: Amount,
    /// Tribute codes exempt regardless of amount.
    pub tributes: Vec<String>,
}

impl Default for ExemptionRules {
    fn default() -> Self {
        ExemptionRules {
            enabled: true,
            amount_threshold: Amount::ZERO,
            tributes: Vec::new(),
        }
    }
}

/// Incomplete taxpayer identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncompleteRules {
    pub enabled: bool,
    /// Placeholder names that mark a record as unidentified.
    pub keywords: Vec<String>,
    /// Also flag rows whose mapped CPF/CNPJ column has no digits.
    pub check_cpf_cnpj: bool,
}

impl Default for IncompleteRules {
    fn default() -> Self {
        IncompleteRules {
            enabled: true,
            keywords: strings(&["IGNORADO", "NÃO INFORMADO", "DESCONHECIDO", "SEM NOME"]),
            check_cpf_cnpj: true,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Everything one processing run needs besides the rows themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleansingConfig {
    pub mapping: ColumnMapping,
    #[serde(default)]
    pub prescription: PrescriptionRules,
    #[serde(default)]
    pub immunity: ImmunityRules,
    #[serde(default)]
    pub exemption: ExemptionRules,
    #[serde(default)]
    pub incomplete: IncompleteRules,
}

impl CleansingConfig {
    /// Default rules over the given mapping.
    pub fn new(mapping: ColumnMapping) -> Self {
        CleansingConfig {
            mapping,
            prescription: PrescriptionRules::default(),
            immunity: ImmunityRules::default(),
            exemption: ExemptionRules::default(),
            incomplete: IncompleteRules::default(),
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CleansingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks value ranges. Column presence is checked later against the data.
    pub fn validate(&self) -> Result<()> {
        if self.prescription.enabled && self.prescription.years == 0 {
            return Err(CleanserError::InvalidConfig(
                "prescription.years must be a positive integer".to_string(),
            ));
        }
        if self.exemption.amount_threshold < Amount::ZERO {
            return Err(CleanserError::InvalidConfig(
                "exemption.amount_threshold must not be negative".to_string(),
            ));
        }

        let blank_keywords = self
            .immunity
            .keywords
            .iter()
            .chain(&self.incomplete.keywords)
            .filter(|k| k.trim().is_empty())
            .count();
        if blank_keywords > 0 {
            warn!("Ignoring {} blank keyword(s) in configuration", blank_keywords);
        }

        Ok(())
    }
}
