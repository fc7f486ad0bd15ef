//! JSON reports for swaps and simulations

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::execution::{optimality_score, HopTrace, PathMetrics, RouterEvent, SwapOutcome};
use crate::shared::errors::AppError;
use crate::shared::types::{Address, Amount};
use crate::shared::utils::{format_address, format_scaled_percent, generate_id};

#[derive(Debug, Serialize)]
pub struct SwapReport {
    pub id: String,
    pub caller: String,
    pub path: Vec<String>,
    pub amount_in: String,
    pub amount_out: String,
    pub min_amount_out: String,
    pub profitable: bool,
    pub price_impact: u64,
    pub price_impact_pct: String,
    pub optimality_score: u64,
    pub hops: Vec<HopTrace>,
    pub events: Vec<RouterEvent>,
    pub timestamp: DateTime<Utc>,
}

impl SwapReport {
    pub fn from_outcome(
        caller: &Address,
        path: &[Address],
        min_amount_out: Amount,
        outcome: SwapOutcome,
        events: Vec<RouterEvent>,
    ) -> Self {
        Self {
            id: generate_id(),
            caller: format_address(caller),
            path: path.iter().map(format_address).collect(),
            amount_in: outcome.amount_in.to_string(),
            amount_out: outcome.amount_out.to_string(),
            min_amount_out: min_amount_out.to_string(),
            profitable: outcome.amount_out > outcome.amount_in,
            price_impact: outcome.price_impact,
            price_impact_pct: format_scaled_percent(outcome.price_impact),
            optimality_score: optimality_score(outcome.amount_in, outcome.amount_out),
            hops: outcome.hops,
            events,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read-only path evaluation
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub path: Vec<String>,
    pub amount_in: String,
    pub expected_output: String,
    pub suggested_min_amount_out: String,
    pub profitable: bool,
    pub price_impact: u64,
    pub price_impact_pct: String,
    pub optimality_score: u64,
    pub hops: Vec<HopTrace>,
    pub timestamp: DateTime<Utc>,
}

impl SimulationReport {
    pub fn from_metrics(path: &[Address], metrics: PathMetrics, suggested_min_amount_out: Amount) -> Self {
        Self {
            path: path.iter().map(format_address).collect(),
            amount_in: metrics.amount_in.to_string(),
            expected_output: metrics.expected_output.to_string(),
            suggested_min_amount_out: suggested_min_amount_out.to_string(),
            profitable: metrics.is_profitable(),
            price_impact: metrics.price_impact,
            price_impact_pct: format_scaled_percent(metrics.price_impact),
            optimality_score: metrics.optimality_score,
            hops: metrics.hops,
            timestamp: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_report_json() {
        let base = Address::from_low_u64_be(1);
        let outcome = SwapOutcome {
            amount_in: Amount::from(100u64),
            amount_out: Amount::from(98u64),
            price_impact: 20_100,
            hops: vec![],
        };
        let report = SwapReport::from_outcome(&base, &[base, base], Amount::from(97u64), outcome, vec![]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["amount_out"], "98");
        assert_eq!(json["profitable"], false);
        assert_eq!(json["optimality_score"], 980_000);
        assert_eq!(json["price_impact_pct"], "2.0100%");
    }
}
