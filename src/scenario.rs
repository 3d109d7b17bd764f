use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::schedule::ScenarioInput;

/// The four numeric fields a user enters for a scenario
///
/// This is what gets persisted; the deposit policy is chosen per calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub initial_balance: f64,
    pub monthly_deposit: f64,
    pub annual_rate_percent: f64,
    pub years: u32,
}

impl ScenarioParams {
    /// Build calculator input for the given deposit policy
    pub fn with_deposit(&self, apply_deposit: bool) -> ScenarioInput {
        ScenarioInput {
            initial_balance: self.initial_balance,
            monthly_deposit: self.monthly_deposit,
            annual_rate_percent: self.annual_rate_percent,
            years: self.years,
            apply_deposit,
        }
    }
}

/// A saved scenario
///
/// `id` is opaque: server-side stores hand out UUIDs, the local store hands
/// out sequence numbers. `created_at` is only used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub initial_balance: f64,
    pub monthly_deposit: f64,
    pub annual_rate_percent: f64,
    pub years: u32,
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    pub fn new(id: String, params: ScenarioParams, created_at: DateTime<Utc>) -> Self {
        Scenario {
            id,
            initial_balance: params.initial_balance,
            monthly_deposit: params.monthly_deposit,
            annual_rate_percent: params.annual_rate_percent,
            years: params.years,
            created_at,
        }
    }

    pub fn params(&self) -> ScenarioParams {
        ScenarioParams {
            initial_balance: self.initial_balance,
            monthly_deposit: self.monthly_deposit,
            annual_rate_percent: self.annual_rate_percent,
            years: self.years,
        }
    }
}

/// Listing order for saved scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first
    #[default]
    Created,
    /// Largest initial balance first
    Balance,
}

/// Sort scenarios in place
///
/// The sort is stable, so scenarios that compare equal keep their stored
/// order.
pub fn sort_scenarios(scenarios: &mut [Scenario], order: SortOrder) {
    match order {
        SortOrder::Created => scenarios.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Balance => scenarios.sort_by(|a, b| {
            b.initial_balance
                .partial_cmp(&a.initial_balance)
                .unwrap_or(Ordering::Equal)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scenario(id: &str, balance: f64, minute: u32) -> Scenario {
        Scenario::new(
            id.to_string(),
            ScenarioParams {
                initial_balance: balance,
                monthly_deposit: 10.0,
                annual_rate_percent: 2.0,
                years: 3,
            },
            Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        )
    }

    fn ids(scenarios: &[Scenario]) -> Vec<&str> {
        scenarios.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn sorts_newest_first() {
        let mut list = vec![scenario("a", 5.0, 1), scenario("b", 1.0, 3), scenario("c", 9.0, 2)];
        sort_scenarios(&mut list, SortOrder::Created);
        assert_eq!(ids(&list), ["b", "c", "a"]);
    }

    #[test]
    fn sorts_by_initial_balance_descending() {
        let mut list = vec![scenario("a", 5.0, 1), scenario("b", 1.0, 3), scenario("c", 9.0, 2)];
        sort_scenarios(&mut list, SortOrder::Balance);
        assert_eq!(ids(&list), ["c", "a", "b"]);
    }

    #[test]
    fn equal_balances_keep_stored_order() {
        let mut list = vec![scenario("a", 5.0, 1), scenario("b", 5.0, 3)];
        sort_scenarios(&mut list, SortOrder::Balance);
        assert_eq!(ids(&list), ["a", "b"]);
    }

    #[test]
    fn sort_names_are_lowercase() {
        let order: SortOrder = serde_json::from_str("\"balance\"").unwrap();
        assert_eq!(order, SortOrder::Balance);
        assert_eq!(serde_json::to_string(&SortOrder::Created).unwrap(), "\"created\"");
        assert!(serde_json::from_str::<SortOrder>("\"date\"").is_err());
    }

    #[test]
    fn params_round_trip_through_record() {
        let record = scenario("x", 42.0, 0);
        assert_eq!(record.params().initial_balance, 42.0);
        assert!(!record.params().with_deposit(false).apply_deposit);
    }
}
