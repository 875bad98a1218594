//! Integration tests for the debt cleanser CLI.
//!
//! These tests run the actual binary against the fixture files in `tests/data`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

fn cmd() -> Command {
    Command::cargo_bin("debt-cleanser").unwrap()
}

/// Run `process` with the given extra arguments and return stdout
fn run_process(extra: &[&str]) -> String {
    let assert = cmd()
        .arg("process")
        .arg(test_data_path("brumado.csv"))
        .arg(test_data_path("config.json"))
        .args(extra)
        .assert()
        .success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn test_headers_lists_columns() {
    cmd()
        .arg("headers")
        .arg(test_data_path("brumado.csv"))
        .assert()
        .success()
        .stdout("Numero da Dívida\nNome Contribuinte\nCPF/CNPJ\nData Vencto\nTotal\nTributo\n");
}

#[test]
fn test_process_prints_report() {
    let output = run_process(&[]);

    assert!(output.starts_with("RELATÓRIO DE HIGIENIZAÇÃO DA DÍVIDA ATIVA"));
    assert!(output.contains("Total de registros:  8"));
    assert!(output.contains("Registros válidos:   1 (12.50%)  R$ 1.234,56"));
    assert!(output.contains("Registros removidos: 7 (87.50%)  R$ 3.630,00"));
    assert!(output.contains("Valor total:         R$ 4.864,56"));
}

#[test]
fn test_process_json_summary() {
    let output = run_process(&["--json"]);
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    let summary = &json["summary"];

    assert_eq!(summary["total_records"], 8);
    assert_eq!(summary["processed_records"], 8);
    assert_eq!(summary["valid_count"], 1);
    assert_eq!(summary["prescribed_count"], 1);
    assert_eq!(summary["immune_count"], 1);
    assert_eq!(summary["exempt_count"], 3);
    assert_eq!(summary["incomplete_count"], 2);
    assert_eq!(summary["total_amount_valid"], "1234.5600");
    assert_eq!(summary["total_amount_removed"], "3630.0000");
    assert_eq!(json["preview"].as_array().unwrap().len(), 8);
    assert_eq!(json["preview"][5]["Motivo_Higienizacao"], "Tributo Isento");
}

#[test]
fn test_process_exports_sections() {
    let dir = tempfile::tempdir().unwrap();
    let export_dir = dir.path().join("saida");
    run_process(&[export_dir.to_str().unwrap()]);

    let line_count = |name: &str| {
        fs::read_to_string(export_dir.join(name))
            .unwrap()
            .lines()
            .count()
    };
    assert_eq!(line_count("todos.csv"), 9);
    assert_eq!(line_count("imunes_isentos.csv"), 5);
    assert_eq!(line_count("prescritos.csv"), 2);
    assert_eq!(line_count("incompletos.csv"), 3);
    assert_eq!(line_count("validos.csv"), 2);

    let summary = fs::read_to_string(export_dir.join("resumo_por_ano.csv")).unwrap();
    let years: Vec<&str> = summary
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(years, vec!["2010", "2021", "2022", "2023", "N/A"]);

    let prescribed = fs::read_to_string(export_dir.join("prescritos.csv")).unwrap();
    assert!(prescribed.contains("Vencimento anterior a 30/06/2019"));
}

#[test]
fn test_missing_column_fails_with_names() {
    cmd()
        .arg("process")
        .arg(test_data_path("brumado.csv"))
        .arg(test_data_path("config_missing_column.json"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Missing columns in file: Vencimento, Valor Corrigido",
        ));
}

#[test]
fn test_missing_file_error() {
    cmd()
        .arg("process")
        .arg("nonexistent.csv")
        .arg(test_data_path("config.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_unsupported_format_error() {
    cmd()
        .arg("headers")
        .arg("divida.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_process_xlsx_input() {
    let assert = cmd()
        .arg("process")
        .arg(test_data_path("tanhacu.xlsx"))
        .arg(test_data_path("config_xlsx.json"))
        .arg("--json")
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    let summary = &json["summary"];

    assert_eq!(summary["total_records"], 4);
    assert_eq!(summary["valid_count"], 1);
    assert_eq!(summary["prescribed_count"], 1);
    assert_eq!(summary["immune_count"], 1);
    assert_eq!(summary["incomplete_count"], 1);
    assert_eq!(summary["total_amount_valid"], "1234.5600");
    assert_eq!(summary["total_amount_removed"], "6100.0000");
    assert_eq!(json["preview"][0]["Vencimento"], "2022-05-10");
}

#[test]
fn test_headers_xlsx_input() {
    cmd()
        .arg("headers")
        .arg(test_data_path("tanhacu.xlsx"))
        .assert()
        .success()
        .stdout("Numero\nContribuinte\nDocumento\nVencimento\nValor\nTributo\n");
}

#[test]
fn test_windows_1252_csv_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cp1252.csv");
    fs::write(
        &input,
        b"Numero;Contribuinte;Documento;Vencimento;Valor;Tributo\n\
          1;UNI\xC3O FEDERAL;00394460000141;15/03/2023;5000;ITR\n",
    )
    .unwrap();

    let assert = cmd()
        .arg("process")
        .arg(&input)
        .arg(test_data_path("config_xlsx.json"))
        .arg("--json")
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["summary"]["immune_count"], 1);
    assert_eq!(json["preview"][0]["Contribuinte"], "UNIÃO FEDERAL");
}

#[test]
fn test_missing_argument_error() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: debt-cleanser"));
}
