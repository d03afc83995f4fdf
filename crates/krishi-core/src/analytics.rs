//! Dashboard aggregates computed from stored data.
//!
//! Only metrics derivable from the store are computed. Figures the dashboard
//! design calls for but no data source feeds yet are named in
//! [`NOT_DERIVED_METRICS`] and served as explicit nulls, never invented.

use serde::{Deserialize, Serialize};

/// Metrics the dashboard displays but the backend has no source for yet.
pub const NOT_DERIVED_METRICS: &[&str] = &[
  "carbon_credits_earned",
  "partner_companies",
  "month_over_month_trends",
];

/// A `(key, count)` aggregation bucket, e.g. farmers per village.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
  pub key:   String,
  pub count: u64,
}

/// Farmer-population aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmerStats {
  pub total:                u64,
  pub assigned:             u64,
  pub unassigned:           u64,
  /// Sum of declared incomes, in rupees.
  pub total_income:         i64,
  pub average_income:       Option<f64>,
  pub average_credit_score: Option<f64>,
  /// Farmers per village, largest first.
  pub by_village:           Vec<GroupCount>,
  /// Farmers growing each crop, largest first.
  pub by_crop:              Vec<GroupCount>,
}

/// Request-queue aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStats {
  pub total:       u64,
  pub by_status:   Vec<GroupCount>,
  pub by_priority: Vec<GroupCount>,
}

/// Scheme-catalogue aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeStats {
  pub total:     u64,
  pub by_status: Vec<GroupCount>,
}

/// Application-pipeline aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStats {
  pub total:     u64,
  pub by_status: Vec<GroupCount>,
}

/// The admin dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
  pub farmers:         FarmerStats,
  pub executives:      u64,
  pub schemes:         SchemeStats,
  pub requests:        RequestStats,
  pub applications:    ApplicationStats,
  /// Each entry of [`NOT_DERIVED_METRICS`] mapped to `null`.
  pub not_derived:     serde_json::Value,
  /// The metric names behind `not_derived`, i.e. what still lacks a source.
  pub pending_sources: Vec<String>,
}

impl DashboardStats {
  /// The explicit-null block for metrics without a data source.
  pub fn not_derived_block() -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for metric in NOT_DERIVED_METRICS {
      map.insert((*metric).to_owned(), serde_json::Value::Null);
    }
    serde_json::Value::Object(map)
  }

  /// The same metric names as an ordered list.
  pub fn pending_sources() -> Vec<String> {
    NOT_DERIVED_METRICS
      .iter()
      .map(|metric| (*metric).to_owned())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_derived_block_is_all_nulls() {
    let block = DashboardStats::not_derived_block();
    let map = block.as_object().unwrap();
    assert_eq!(map.len(), NOT_DERIVED_METRICS.len());
    assert!(map.values().all(serde_json::Value::is_null));
  }
}
