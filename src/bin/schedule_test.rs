use savings_calculator::report::{ScheduleReport, format_amount};
use savings_calculator::scenario::ScenarioParams;
use savings_calculator::schedule::compute;
use savings_calculator::validation::{ScenarioForm, validate};

fn params(initial: f64, deposit: f64, rate: f64, years: u32) -> ScenarioParams {
    ScenarioParams {
        initial_balance: initial,
        monthly_deposit: deposit,
        annual_rate_percent: rate,
        years,
    }
}

fn test_zero_rate_identity() {
    println!("\n====== Testing zero rate identity ======");
    let schedule = compute(1234.5, 100.0, 0.0, 7, false);
    assert_eq!(schedule.len(), 7);
    for summary in &schedule {
        assert_eq!(summary.year_end_balance, 1234.5);
        assert_eq!(summary.year_end_interest, 0.0);
    }
    println!("✓ Balance stays at 1234.50 with no interest for 7 years");
}

fn test_year_numbering() {
    println!("\n====== Testing year numbering ======");
    let schedule = compute(500.0, 20.0, 4.0, 12, true);
    for (i, summary) in schedule.iter().enumerate() {
        assert_eq!(summary.year, i as u32 + 1);
    }
    println!("✓ Years run 1..=12 without gaps");
}

fn test_reference_values() {
    println!("\n====== Testing reference values ======");
    let report = ScheduleReport::build(params(1000.0, 100.0, 5.0, 5));

    let first = report.without_deposit[0];
    assert_eq!(format_amount(first.year_end_balance), "1051.16");
    assert_eq!(format_amount(first.year_end_interest), "51.16");
    println!("✓ Year 1 without deposit: {} / {}",
        format_amount(first.year_end_balance),
        format_amount(first.year_end_interest));

    let first = report.with_deposit[0];
    let deposits = 1200.0;
    assert!((first.year_end_balance - (1000.0 + deposits + first.year_end_interest)).abs() < 1e-9);
    println!("✓ Year 1 with deposit: {} ({} of it interest)",
        format_amount(first.year_end_balance),
        format_amount(first.year_end_interest));
}

fn test_deposit_dominance() {
    println!("\n====== Testing deposit dominance ======");
    let report = ScheduleReport::build(params(1000.0, 75.0, 3.0, 20));
    for (without, with) in report.without_deposit.iter().zip(&report.with_deposit) {
        assert!(with.year_end_balance > without.year_end_balance);
    }
    println!("✓ Depositing beats not depositing in every year");
}

fn test_validation_gate() {
    println!("\n====== Testing validation gate ======");
    let cases = [
        (ScenarioForm::new("abc", "0", "1", "1"), "Initial balance must be a number"),
        (ScenarioForm::new("1", "-3", "1", "1"), "Monthly deposit cannot be negative"),
        (ScenarioForm::new("1", "0", "1", "0"), "Years must be a positive whole number"),
        (ScenarioForm::new("1", "0", "1", "1.5"), "Years must be a positive whole number"),
    ];
    for (form, expected) in cases {
        let err = validate(&form).unwrap_err();
        assert_eq!(err.to_string(), expected);
        println!("✓ Rejected with \"{}\"", expected);
    }
}

fn main() {
    test_zero_rate_identity();
    test_year_numbering();
    test_reference_values();
    test_deposit_dominance();
    test_validation_gate();
    println!("\nAll schedule checks passed");
}
