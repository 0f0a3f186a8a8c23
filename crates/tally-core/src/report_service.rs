//! Period range reports with a trailing totals row.

use rust_decimal::Decimal;

use tally_domain::{
    compare_periods, parse_period, Book, Category, LedgerRecord, RangeMode, RowOrder,
};

use crate::{validate::AMOUNT_SCALE, CoreError};

/// First-column label of the aggregate row.
pub const TOTAL_LABEL: &str = "TOTAL";
pub const PERIOD_HEADING: &str = "Period";
pub const TOTAL_HEADING: &str = "Total";
pub const DIFFERENCE_HEADING: &str = "Reconciliation difference";

/// Record selection and ordering for [`ReportService::export`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub range: RangeMode,
    pub order: RowOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub label: String,
    pub values: Vec<Decimal>,
}

/// Format-neutral export: a header, one row per record and a totals row.
///
/// `headers[0]` is the label column; `headers[1..]` line up with each row's
/// `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularDocument {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub totals: ReportRow,
}

impl TabularDocument {
    /// Position of a value column by heading.
    pub fn value_index(&self, heading: &str) -> Option<usize> {
        self.headers
            .iter()
            .skip(1)
            .position(|candidate| candidate == heading)
    }

    pub fn periods(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }
}

pub struct ReportService;

impl ReportService {
    /// Category columns emitted before the computed ones, in declaration order.
    pub fn category_columns() -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| *category != Category::ActualIncomeVsInvoiced)
            .collect()
    }

    pub fn headers() -> Vec<String> {
        let mut headers = vec![PERIOD_HEADING.to_string()];
        headers.extend(
            Self::category_columns()
                .into_iter()
                .map(|category| category.label().to_string()),
        );
        headers.push(TOTAL_HEADING.into());
        headers.push(Category::ActualIncomeVsInvoiced.label().into());
        headers.push(DIFFERENCE_HEADING.into());
        headers
    }

    /// Resolves both boundary periods and returns the records in between.
    pub fn select<'a>(
        book: &'a Book,
        start: &str,
        end: &str,
        options: ExportOptions,
    ) -> Result<Vec<&'a LedgerRecord>, CoreError> {
        let start = start.trim();
        let end = end.trim();
        let first = book
            .record_by_period(start)
            .ok_or_else(|| CoreError::NotFound(format!("start period `{start}` not found")))?;
        let last = book
            .record_by_period(end)
            .ok_or_else(|| CoreError::NotFound(format!("end period `{end}` not found")))?;

        let mut selected: Vec<&LedgerRecord> = match options.range {
            RangeMode::Insertion => book
                .records
                .iter()
                .filter(|record| record.id >= first.id && record.id <= last.id)
                .collect(),
            RangeMode::Chronological => {
                let from = parse_period(&first.period).ok_or_else(|| {
                    CoreError::Validation(format!("start period `{start}` is not a Mon-YY label"))
                })?;
                let to = parse_period(&last.period).ok_or_else(|| {
                    CoreError::Validation(format!("end period `{end}` is not a Mon-YY label"))
                })?;
                book.records
                    .iter()
                    .filter(|record| {
                        parse_period(&record.period)
                            .map(|date| date >= from && date <= to)
                            .unwrap_or(false)
                    })
                    .collect()
            }
        };

        if selected.is_empty() {
            return Err(CoreError::NotFound(format!(
                "no records between {start} and {end}"
            )));
        }
        if options.order == RowOrder::Chronological {
            selected.sort_by(|a, b| compare_periods(&a.period, &b.period));
        }
        Ok(selected)
    }

    pub fn export(
        book: &Book,
        start: &str,
        end: &str,
        options: ExportOptions,
    ) -> Result<TabularDocument, CoreError> {
        let records = Self::select(book, start, end, options)?;
        let rows: Vec<ReportRow> = records.iter().map(|record| Self::row(record)).collect();

        let width = rows.first().map(|row| row.values.len()).unwrap_or(0);
        let mut sums = vec![Decimal::ZERO; width];
        for row in &rows {
            for (sum, value) in sums.iter_mut().zip(&row.values) {
                *sum += *value;
            }
        }

        tracing::info!(start, end, rows = rows.len(), "report exported");
        Ok(TabularDocument {
            headers: Self::headers(),
            rows,
            totals: ReportRow {
                label: TOTAL_LABEL.into(),
                values: sums,
            },
        })
    }

    /// One report row; every value rounded to two decimals.
    pub fn row(record: &LedgerRecord) -> ReportRow {
        let total = record.total();
        let mut values: Vec<Decimal> = Self::category_columns()
            .into_iter()
            .map(|category| record.amount(category))
            .collect();
        values.push(total);
        values.push(record.actual_income_vs_invoiced);
        values.push(total - record.actual_income_vs_invoiced);
        ReportRow {
            label: record.period.clone(),
            values: values
                .into_iter()
                .map(|value| value.round_dp(AMOUNT_SCALE))
                .collect(),
        }
    }
}
