use crate::report::{ScheduleReport, format_amount};
use std::error::Error;

/// Convert a report to CSV format
///
/// One row per year-end summary, rows of the no-deposit schedule first.
/// Amounts are formatted to two decimals just like the on-screen tables.
///
/// # Arguments
/// * `report` - The pair of schedules to export
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - CSV content as a string or an error
///
/// # Examples
/// ```
/// use savings_calculator::downloader::to_csv;
/// use savings_calculator::report::ScheduleReport;
/// use savings_calculator::scenario::ScenarioParams;
///
/// let report = ScheduleReport::build(ScenarioParams {
///     initial_balance: 1000.0,
///     monthly_deposit: 100.0,
///     annual_rate_percent: 5.0,
///     years: 2,
/// });
/// let csv = to_csv(&report).unwrap();
/// assert_eq!(csv.lines().count(), 1 + 4);
/// ```
pub fn to_csv(report: &ScheduleReport) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::from("Policy,Year,Year-End Balance,Year-End Interest\n");

    for (policy, schedule) in report.tables() {
        for summary in schedule {
            csv_content.push_str(&format!(
                "{},{},{},{}\n",
                policy,
                summary.year,
                format_amount(summary.year_end_balance),
                format_amount(summary.year_end_interest)
            ));
        }
    }

    Ok(csv_content)
}

/// Convert a report to XLSX format
///
/// Each policy gets its own worksheet with `Year`, `Year-End Balance` and
/// `Year-End Interest` columns. Cells keep full precision and are displayed
/// with a two-decimal number format.
///
/// # Arguments
/// * `report` - The pair of schedules to export
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
pub fn to_xlsx(report: &ScheduleReport) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("0.00");

    for (policy, schedule) in report.tables() {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(policy)?;
        worksheet.write_string_with_format(0, 0, "Year", &header)?;
        worksheet.write_string_with_format(0, 1, "Year-End Balance", &header)?;
        worksheet.write_string_with_format(0, 2, "Year-End Interest", &header)?;

        for (i, summary) in schedule.iter().enumerate() {
            let row = (i + 1) as u32;
            worksheet.write_number(row, 0, summary.year)?;
            worksheet.write_number_with_format(row, 1, summary.year_end_balance, &money)?;
            worksheet.write_number_with_format(row, 2, summary.year_end_interest, &money)?;
        }

        workbook.push_worksheet(worksheet);
    }

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}
