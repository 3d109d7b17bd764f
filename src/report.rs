use serde::Serialize;

use crate::scenario::ScenarioParams;
use crate::schedule::YearSummary;

/// Both schedules for one set of inputs
///
/// The same four scalars are run once without and once with the monthly
/// deposit, which is how results are always presented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub params: ScenarioParams,
    pub without_deposit: Vec<YearSummary>,
    pub with_deposit: Vec<YearSummary>,
}

/// A table row as displayed, amounts already formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedRow {
    pub year: u32,
    pub balance: String,
    pub interest: String,
}

/// Display form of a report, used as the JSON response body
#[derive(Debug, Clone, Serialize)]
pub struct FormattedReport {
    pub params: ScenarioParams,
    pub without_deposit: Vec<FormattedRow>,
    pub with_deposit: Vec<FormattedRow>,
}

impl ScheduleReport {
    pub fn build(params: ScenarioParams) -> Self {
        ScheduleReport {
            params,
            without_deposit: params.with_deposit(false).compute(),
            with_deposit: params.with_deposit(true).compute(),
        }
    }

    /// Iterate over `(policy label, schedule)` pairs in display order
    pub fn tables(&self) -> [(&'static str, &[YearSummary]); 2] {
        [
            ("Without Deposit", self.without_deposit.as_slice()),
            ("With Deposit", self.with_deposit.as_slice()),
        ]
    }

    pub fn formatted(&self) -> FormattedReport {
        FormattedReport {
            params: self.params,
            without_deposit: format_rows(&self.without_deposit),
            with_deposit: format_rows(&self.with_deposit),
        }
    }
}

/// Format an amount to exactly two decimal places
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_rows(schedule: &[YearSummary]) -> Vec<FormattedRow> {
    schedule
        .iter()
        .map(|summary| FormattedRow {
            year: summary.year,
            balance: format_amount(summary.year_end_balance),
            interest: format_amount(summary.year_end_interest),
        })
        .collect()
}

/// Render a schedule as a fixed-width text table
pub fn render_table(title: &str, schedule: &[YearSummary]) -> String {
    let rows = format_rows(schedule);
    let balance_width = rows
        .iter()
        .map(|r| r.balance.len())
        .chain(std::iter::once("Year-End Balance".len()))
        .max()
        .unwrap_or(0);
    let interest_width = rows
        .iter()
        .map(|r| r.interest.len())
        .chain(std::iter::once("Year-End Interest".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&format!(
        "{:>4} | {:>bw$} | {:>iw$}\n",
        "Year",
        "Year-End Balance",
        "Year-End Interest",
        bw = balance_width,
        iw = interest_width
    ));
    out.push_str(&format!(
        "{}-+-{}-+-{}\n",
        "-".repeat(4),
        "-".repeat(balance_width),
        "-".repeat(interest_width)
    ));
    for row in rows {
        out.push_str(&format!(
            "{:>4} | {:>bw$} | {:>iw$}\n",
            row.year,
            row.balance,
            row.interest,
            bw = balance_width,
            iw = interest_width
        ));
    }
    out
}
