use serde::{Deserialize, Serialize};

/// Number of compounding periods in a year
pub const MONTHS_PER_YEAR: u32 = 12;

/// Inputs for a single schedule calculation
///
/// Built fresh for every request and never mutated afterwards. The values are
/// expected to have passed through [`crate::validation`] already; the
/// calculator itself does not check them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Starting principal
    pub initial_balance: f64,

    /// Amount added every month when `apply_deposit` is set
    pub monthly_deposit: f64,

    /// Nominal annual interest rate in percent (5.0 means 5%)
    pub annual_rate_percent: f64,

    /// Number of full years to simulate
    pub years: u32,

    /// Whether the monthly deposit is added before interest accrues
    pub apply_deposit: bool,
}

/// Balance and interest snapshot at the close of a simulated year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    /// 1-based year number
    pub year: u32,

    /// Balance right after the 12th month of the year
    pub year_end_balance: f64,

    /// Interest accrued during this year only
    pub year_end_interest: f64,
}

impl ScenarioInput {
    /// Run the schedule for these inputs
    ///
    /// # Examples
    /// ```
    /// use savings_calculator::schedule::ScenarioInput;
    ///
    /// let input = ScenarioInput {
    ///     initial_balance: 1000.0,
    ///     monthly_deposit: 100.0,
    ///     annual_rate_percent: 5.0,
    ///     years: 2,
    ///     apply_deposit: true,
    /// };
    /// assert_eq!(input.compute().len(), 2);
    /// ```
    pub fn compute(&self) -> Vec<YearSummary> {
        compute(
            self.initial_balance,
            self.monthly_deposit,
            self.annual_rate_percent,
            self.years,
            self.apply_deposit,
        )
    }
}

/// Simulate monthly compounding and collect one summary per completed year
///
/// The deposit (when enabled) is added to the opening balance before the
/// month's interest is computed, so deposited funds earn interest in the month
/// they arrive. No rounding happens here; formatting to two decimals is left
/// to the presentation layer.
///
/// # Arguments
/// * `initial_balance` - Starting principal
/// * `monthly_deposit` - Deposit added each month when `apply_deposit` is true
/// * `annual_rate_percent` - Nominal annual rate in percent
/// * `years` - Number of years to simulate; zero yields an empty schedule
/// * `apply_deposit` - Deposit policy
///
/// # Returns
/// * `Vec<YearSummary>` - Year-end summaries in increasing year order
pub fn compute(
    initial_balance: f64,
    monthly_deposit: f64,
    annual_rate_percent: f64,
    years: u32,
    apply_deposit: bool,
) -> Vec<YearSummary> {
    let total_months = years.saturating_mul(MONTHS_PER_YEAR);
    let deposit = if apply_deposit { monthly_deposit } else { 0.0 };
    let monthly_rate = (annual_rate_percent / 100.0) / MONTHS_PER_YEAR as f64;

    let mut summaries = Vec::with_capacity(years as usize);
    let mut opening_balance = initial_balance;
    let mut yearly_interest = 0.0;
    let mut current_year = 1;

    for month in 1..=total_months {
        let interest = (opening_balance + deposit) * monthly_rate;
        yearly_interest += interest;
        let closing_balance = opening_balance + deposit + interest;

        if month % MONTHS_PER_YEAR == 0 {
            summaries.push(YearSummary {
                year: current_year,
                year_end_balance: closing_balance,
                year_end_interest: yearly_interest,
            });
            current_year += 1;
            yearly_interest = 0.0;
        }

        opening_balance = closing_balance;
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_rate_without_deposit_keeps_balance() {
        let schedule = compute(2500.0, 300.0, 0.0, 4, false);
        assert_eq!(schedule.len(), 4);
        for summary in &schedule {
            assert_eq!(summary.year_end_balance, 2500.0);
            assert_eq!(summary.year_end_interest, 0.0);
        }
    }

    #[test]
    fn years_are_numbered_consecutively() {
        let schedule = compute(100.0, 10.0, 3.5, 30, true);
        let years: Vec<u32> = schedule.iter().map(|s| s.year).collect();
        assert_eq!(years, (1..=30).collect::<Vec<_>>());
    }

    #[test]
    fn zero_years_is_empty() {
        assert!(compute(1000.0, 100.0, 5.0, 0, true).is_empty());
    }

    #[test]
    fn single_year_yields_one_summary() {
        assert_eq!(compute(1000.0, 100.0, 5.0, 1, false).len(), 1);
    }

    #[test]
    fn first_year_without_deposit() {
        let schedule = compute(1000.0, 100.0, 5.0, 5, false);
        assert_relative_eq!(schedule[0].year_end_balance, 1051.16, epsilon = 0.005);
        assert_relative_eq!(schedule[0].year_end_interest, 51.16, epsilon = 0.005);
    }

    #[test]
    fn first_year_with_deposit() {
        let schedule = compute(1000.0, 100.0, 5.0, 5, true);
        let first = schedule[0];
        assert_relative_eq!(
            first.year_end_balance,
            1000.0 + 1200.0 + first.year_end_interest,
            epsilon = 1e-9
        );
        // deposits earn interest in the month they arrive
        let mut expected = 1000.0;
        for _ in 0..12 {
            expected = (expected + 100.0) * (1.0 + 0.05 / 12.0);
        }
        assert_relative_eq!(first.year_end_balance, expected, epsilon = 1e-9);
    }

    #[test]
    fn deposit_run_dominates() {
        let without = compute(1000.0, 50.0, 4.0, 10, false);
        let with = compute(1000.0, 50.0, 4.0, 10, true);
        for (a, b) in without.iter().zip(&with) {
            assert!(b.year_end_balance > a.year_end_balance);
        }
    }

    #[test]
    fn zero_deposit_ignores_policy() {
        assert_eq!(
            compute(1000.0, 0.0, 5.0, 3, true),
            compute(1000.0, 0.0, 5.0, 3, false)
        );
    }

    #[test]
    fn yearly_interest_adds_up_to_total_growth() {
        let schedule = compute(1000.0, 100.0, 6.0, 8, true);
        let interest: f64 = schedule.iter().map(|s| s.year_end_interest).sum();
        let last = schedule.last().unwrap().year_end_balance;
        assert_relative_eq!(interest, last - 1000.0 - 100.0 * 96.0, epsilon = 1e-6);
    }
}
