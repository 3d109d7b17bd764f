//! Input gate in front of the calculator.
//!
//! Raw text fields are parsed and checked here so that the calculator only
//! ever sees finite, non-negative numbers and a positive whole year count.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::scenario::ScenarioParams;

/// Upper bound on the simulated horizon
pub const MAX_YEARS: u32 = 1000;

lazy_static! {
    static ref NUMBER_REGEX: Regex =
        Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap();
}

/// Rejection reasons, worded for the person filling in the form
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} cannot be negative")]
    Negative(&'static str),

    #[error("Years must be a positive whole number")]
    InvalidYears,

    #[error("Years cannot exceed 1000 (server limit)")]
    TooManyYears,
}

/// Raw scenario fields as submitted by a form or JSON body
///
/// JSON callers may send either strings or numbers for each field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioForm {
    #[serde(deserialize_with = "string_or_number")]
    pub initial_balance: String,
    #[serde(deserialize_with = "string_or_number")]
    pub monthly_deposit: String,
    #[serde(deserialize_with = "string_or_number")]
    pub annual_rate_percent: String,
    #[serde(deserialize_with = "string_or_number")]
    pub years: String,
}

impl ScenarioForm {
    pub fn new(
        initial_balance: impl Into<String>,
        monthly_deposit: impl Into<String>,
        annual_rate_percent: impl Into<String>,
        years: impl Into<String>,
    ) -> Self {
        ScenarioForm {
            initial_balance: initial_balance.into(),
            monthly_deposit: monthly_deposit.into(),
            annual_rate_percent: annual_rate_percent.into(),
            years: years.into(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// Parse a single field into a finite number
fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if !NUMBER_REGEX.is_match(raw) {
        return Err(ValidationError::NotANumber(field));
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NotANumber(field)),
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotANumber(field));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative(field));
    }
    Ok(value)
}

fn check_years(value: f64) -> Result<u32, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotANumber("Years"));
    }
    if value < 1.0 || value.fract() != 0.0 {
        return Err(ValidationError::InvalidYears);
    }
    if value > MAX_YEARS as f64 {
        return Err(ValidationError::TooManyYears);
    }
    Ok(value as u32)
}

/// Validate raw form fields
///
/// Fields are checked in form order and the first failure is returned.
///
/// # Examples
/// ```
/// use savings_calculator::validation::{validate, ScenarioForm};
///
/// let params = validate(&ScenarioForm::new("1000", "100", "5", "5")).unwrap();
/// assert_eq!(params.years, 5);
///
/// let err = validate(&ScenarioForm::new("1000", "-1", "5", "5")).unwrap_err();
/// assert_eq!(err.to_string(), "Monthly deposit cannot be negative");
/// ```
pub fn validate(form: &ScenarioForm) -> Result<ScenarioParams, ValidationError> {
    let initial_balance = parse_number("Initial balance", &form.initial_balance)?;
    let initial_balance = check_amount("Initial balance", initial_balance)?;
    let monthly_deposit = parse_number("Monthly deposit", &form.monthly_deposit)?;
    let monthly_deposit = check_amount("Monthly deposit", monthly_deposit)?;
    let annual_rate_percent = parse_number("Annual rate", &form.annual_rate_percent)?;
    let annual_rate_percent = check_amount("Annual rate", annual_rate_percent)?;
    let years = check_years(parse_number("Years", &form.years)?)?;

    Ok(ScenarioParams {
        initial_balance,
        monthly_deposit,
        annual_rate_percent,
        years,
    })
}

/// Apply the numeric rules to already-parsed parameters
pub fn validate_params(params: &ScenarioParams) -> Result<(), ValidationError> {
    check_amount("Initial balance", params.initial_balance)?;
    check_amount("Monthly deposit", params.monthly_deposit)?;
    check_amount("Annual rate", params.annual_rate_percent)?;
    check_years(params.years as f64)?;
    Ok(())
}
