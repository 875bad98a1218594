//! Scenario tests for the classification pipeline and its invariants.

use chrono::NaiveDate;
use debt_cleanser::cell::row;
use debt_cleanser::{
    parse_amount, parse_date, Amount, CellValue, CleanserError, Cleanser, CleansingConfig,
    ColumnMapping, Row, Status,
};
use std::str::FromStr;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn mapping(with_doc: bool) -> ColumnMapping {
    ColumnMapping {
        debt_id: "Numero".to_string(),
        taxpayer_name: "Contribuinte".to_string(),
        due_date: "Vencimento".to_string(),
        amount: "Valor".to_string(),
        cpf_cnpj: with_doc.then(|| "Documento".to_string()),
        tribute_type: Some("Tributo".to_string()),
        tax_year: None,
    }
}

fn cleanser(config: CleansingConfig) -> Cleanser {
    Cleanser::with_today(config, ymd(2024, 6, 30)).unwrap()
}

fn debt(id: &str, name: &str, due: CellValue, amount: CellValue, doc: &str, tribute: &str) -> Row {
    row([
        ("Numero", CellValue::from(id)),
        ("Contribuinte", name.into()),
        ("Vencimento", due),
        ("Valor", amount),
        ("Documento", doc.into()),
        ("Tributo", tribute.into()),
    ])
}

fn mixed_rows() -> Vec<Row> {
    vec![
        debt("1", "JOAO DA SILVA", "10/05/2022".into(), "R$ 1.234,56".into(), "12345678901", "IPTU"),
        debt("2", "MARIA SOUZA", "2012".into(), CellValue::Number(800.0), "98765432100", "IPTU"),
        debt("3", "SINDICATO DOS BANCARIOS", CellValue::Number(44927.0), "2500".into(), "11222333000144", "ISS"),
        debt("4", "PEDRO ALVES", CellValue::Date(ymd(2023, 2, 1)), "12,30".into(), "22233344455", "ISS"),
        debt("5", "DESCONHECIDO", "2023-01-01".into(), "900".into(), "33344455566", "IPTU"),
        debt("6", "LUCIA MENDES", "garbage".into(), "abc".into(), "", "TAXA LIXO"),
        debt("7", "ROBERTO NUNES", CellValue::Empty, CellValue::Empty, "44455566677", "ITBI"),
        debt("8", "AB", "01/01/2024".into(), "75,00".into(), "55566677788", "IPTU"),
    ]
}

fn full_config() -> CleansingConfig {
    let mut config = CleansingConfig::new(mapping(true));
    config.exemption.amount_threshold = Amount::from_str("50").unwrap();
    config.exemption.tributes = vec!["Taxa Lixo".to_string()];
    config
}

#[test]
fn test_date_parsing_table() {
    assert_eq!(parse_date(&"31/01/2020".into()), Some(ymd(2020, 1, 31)));
    assert_eq!(parse_date(&"2020-01-31".into()), Some(ymd(2020, 1, 31)));
    assert_eq!(parse_date(&"31-01-2020".into()), Some(ymd(2020, 1, 31)));
    assert_eq!(parse_date(&"2019".into()), Some(ymd(2019, 1, 1)));
    assert_eq!(parse_date(&CellValue::Number(2019.0)), Some(ymd(2019, 1, 1)));
    assert_eq!(parse_date(&"garbage".into()), None);
}

#[test]
fn test_two_digit_year_is_not_a_date() {
    assert_eq!(parse_date(&"31/01/20".into()), None);
    assert_eq!(parse_date(&"20-01-31".into()), None);
    assert_eq!(parse_date(&"1/1/202".into()), None);

    let rows = vec![debt("1", "JOAO DA SILVA", "31/01/20".into(), "500".into(), "12345678901", "IPTU")];
    let outcome = cleanser(full_config()).process(&rows).unwrap();
    assert_eq!(outcome.rows[0].status(), Some(Status::Valid));
}

#[test]
fn test_amount_parsing_table() {
    let expected = Amount::from_str("1234.56").unwrap();
    assert_eq!(parse_amount(&"R$ 1.234,56".into()), expected);
    assert_eq!(parse_amount(&"1234,56".into()), expected);
    assert_eq!(parse_amount(&"1234.56".into()), expected);
    assert_eq!(parse_amount(&"".into()), Amount::ZERO);
    assert_eq!(parse_amount(&"abc".into()), Amount::ZERO);
}

#[test]
fn test_mixed_rows_statuses() {
    let outcome = cleanser(full_config()).process(&mixed_rows()).unwrap();
    let statuses: Vec<Status> = outcome.rows.iter().map(|r| r.status().unwrap()).collect();

    assert_eq!(
        statuses,
        vec![
            Status::Valid,
            Status::Prescribed,
            Status::Immune,
            Status::Exempt,
            Status::Incomplete,
            Status::Exempt,
            Status::Exempt,
            Status::Incomplete,
        ]
    );
    assert_eq!(outcome.rows[3].reason(), "Valor abaixo de R$ 50,00");
    assert_eq!(outcome.rows[5].reason(), "Tributo Isento");
}

#[test]
fn test_status_counts_sum_to_total() {
    let outcome = cleanser(full_config()).process(&mixed_rows()).unwrap();
    let s = &outcome.summary;

    assert_eq!(s.total_records, 8);
    assert_eq!(s.processed_records, s.total_records);
    assert_eq!(
        s.valid_count + s.prescribed_count + s.immune_count + s.exempt_count + s.incomplete_count,
        s.total_records
    );
}

#[test]
fn test_amount_totals_cover_every_row() {
    let rows = mixed_rows();
    let outcome = cleanser(full_config()).process(&rows).unwrap();

    let expected: Amount = rows.iter().map(|r| parse_amount(&r["Valor"])).sum();
    assert_eq!(outcome.summary.total_amount(), expected);
    assert_eq!(
        outcome.summary.total_amount_valid,
        Amount::from_str("1234.56").unwrap()
    );
}

#[test]
fn test_reclassifying_annotated_rows_is_stable() {
    let cleanser = cleanser(full_config());
    let first = cleanser.process(&mixed_rows()).unwrap();

    let mut annotated: Vec<Row> = first.rows.iter().map(|r| r.fields().clone()).collect();
    annotated.reverse();
    let second = cleanser.process(&annotated).unwrap();

    for (a, b) in first.rows.iter().zip(second.rows.iter().rev()) {
        assert_eq!(a.status(), b.status());
        assert_eq!(a.reason(), b.reason());
    }
}

#[test]
fn test_prescription_wins_over_immunity() {
    let rows = vec![debt(
        "1",
        "ESTADO DA BAHIA",
        "30/06/2014".into(),
        "1000".into(),
        "13937073000156",
        "ICMS",
    )];
    let outcome = cleanser(full_config()).process(&rows).unwrap();

    assert_eq!(outcome.rows[0].status(), Some(Status::Prescribed));
    assert_eq!(outcome.summary.immune_count, 0);
}

#[test]
fn test_unmapped_document_never_incomplete() {
    let mut config = full_config();
    config.mapping = mapping(false);
    config.incomplete.check_cpf_cnpj = true;

    let rows = vec![debt("1", "JOAO DA SILVA", "10/05/2022".into(), "500".into(), "", "IPTU")];
    let outcome = cleanser(config).process(&rows).unwrap();

    assert_eq!(outcome.rows[0].status(), Some(Status::Valid));
}

#[test]
fn test_mapped_empty_document_is_incomplete() {
    let rows = vec![debt("1", "JOAO DA SILVA", "10/05/2022".into(), "500".into(), "--", "IPTU")];
    let outcome = cleanser(full_config()).process(&rows).unwrap();

    assert_eq!(outcome.rows[0].status(), Some(Status::Incomplete));
}

#[test]
fn test_missing_due_date_column_is_fatal() {
    let rows = vec![row([
        ("Numero", "1"),
        ("Contribuinte", "JOAO DA SILVA"),
        ("Valor", "100"),
    ])];
    let err = cleanser(full_config()).process(&rows).unwrap_err();

    match err {
        CleanserError::MissingColumns { columns } => {
            assert_eq!(columns, vec!["Vencimento".to_string()])
        }
        other => panic!("Expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_disabled_rules_leave_rows_valid() {
    let mut config = full_config();
    config.prescription.enabled = false;
    config.immunity.enabled = false;
    config.exemption.enabled = false;
    config.incomplete.enabled = false;

    let outcome = cleanser(config).process(&mixed_rows()).unwrap();
    assert_eq!(outcome.summary.valid_count, 8);
    assert!(outcome.summary.total_amount_removed.is_zero());
    assert!(outcome.rows.iter().all(|r| r.reason().is_empty()));
}
