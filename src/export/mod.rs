//! Spreadsheet serialization of a [`TabularDocument`].

use std::io::Write;

use rust_decimal::Decimal;
use tally_core::TabularDocument;
use tally_domain::TotalsStyle;

use crate::errors::Result;

/// Writes the header, one line per period and the `TOTAL` line.
///
/// With [`TotalsStyle::Formulas`] each total cell is `=SUM(<col>2:<col>n)`
/// over the data rows so the sheet stays live when edited.
pub fn write_csv<W: Write>(document: &TabularDocument, writer: W, style: TotalsStyle) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(&document.headers)?;
    for row in &document.rows {
        csv.write_record(
            std::iter::once(row.label.clone()).chain(row.values.iter().map(format_amount)),
        )?;
    }

    let last_row = document.rows.len() + 1;
    let totals: Vec<String> = match style {
        TotalsStyle::Values => document.totals.values.iter().map(format_amount).collect(),
        TotalsStyle::Formulas => (0..document.totals.values.len())
            .map(|index| {
                let column = column_letter(index + 1);
                format!("=SUM({column}2:{column}{last_row})")
            })
            .collect(),
    };
    csv.write_record(std::iter::once(document.totals.label.clone()).chain(totals))?;

    csv.flush()?;
    Ok(())
}

fn format_amount(value: &Decimal) -> String {
    format!("{:.2}", value)
}

/// Spreadsheet column name for a zero-based index: 0 is `A`, 26 is `AA`.
pub fn column_letter(index: usize) -> String {
    let mut remaining = index + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let offset = ((remaining - 1) % 26) as u8;
        letters.push((b'A' + offset) as char);
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_follow_spreadsheet_naming() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn amounts_always_show_two_decimals() {
        assert_eq!(format_amount(&Decimal::new(5, 0)), "5.00");
        assert_eq!(format_amount(&Decimal::new(125, 2)), "1.25");
    }
}
