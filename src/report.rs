//! Plain-text cleansing report.

use crate::aggregate::CleansingResult;
use crate::config::ColumnMapping;
use crate::error::Result;
use crate::status::Status;
use rust_decimal::Decimal;
use std::io::Write;

/// Share of `part` in `whole`, in percent with two decimals.
fn percent(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(2)
}

/// Renders the summary of a run: totals with percentages, a breakdown per
/// removal reason and the column mapping in effect.
pub fn write_report<W: Write>(
    result: &CleansingResult,
    mapping: &ColumnMapping,
    mut writer: W,
) -> Result<()> {
    let total = result.total_records;
    let total_amount = result.total_amount();

    writeln!(writer, "RELATÓRIO DE HIGIENIZAÇÃO DA DÍVIDA ATIVA")?;
    writeln!(writer, "=========================================")?;
    writeln!(writer)?;

    writeln!(writer, "Resumo")?;
    writeln!(writer, "  Total de registros:  {}", total)?;
    writeln!(
        writer,
        "  Registros válidos:   {} ({:.2}%)  {} ({:.2}%)",
        result.valid_count,
        percent(result.valid_count, total),
        result.total_amount_valid.to_brl(),
        result.total_amount_valid.percent_of(total_amount)
    )?;
    writeln!(
        writer,
        "  Registros removidos: {} ({:.2}%)  {} ({:.2}%)",
        result.removed_count(),
        percent(result.removed_count(), total),
        result.total_amount_removed.to_brl(),
        result.total_amount_removed.percent_of(total_amount)
    )?;
    writeln!(writer, "  Valor total:         {}", total_amount.to_brl())?;
    writeln!(writer)?;

    writeln!(writer, "Detalhamento por motivo")?;
    for status in Status::ALL.iter().filter(|s| !s.is_valid()) {
        let count = result.count(*status);
        writeln!(
            writer,
            "  {:<18} {} ({:.2}%)",
            format!("{}:", status.label()),
            count,
            percent(count, total)
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "Mapeamento de colunas")?;
    for (field, column) in mapping.required().into_iter().chain(mapping.optional()) {
        writeln!(writer, "  {:<14} {}", format!("{}:", field), column)?;
    }

    writer.flush()?;
    Ok(())
}
