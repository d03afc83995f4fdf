//! Ready-made report layouts.

use chrono::{DateTime, Utc};
use krishi_core::farmer::Farmer;

use crate::{Column, TableReport};

/// The farmer register: one row per farmer, in the order given.
pub fn farmer_register(farmers: &[Farmer], generated_at: DateTime<Utc>) -> TableReport {
  let mut report = TableReport::new("Farmer Register", vec![
    Column::new("Name", 110),
    Column::new("Mobile", 90),
    Column::new("Village", 80),
    Column::new("Crops", 90),
    Column::new("Income", 55),
    Column::new("Credit", 45),
    Column::new("Assigned", 45),
  ]);
  report.subtitle = Some(format!(
    "Generated {} UTC \u{b7} {} farmers",
    generated_at.format("%Y-%m-%d %H:%M"),
    farmers.len()
  ));
  for farmer in farmers {
    report.rows.push(vec![
      farmer.name.clone(),
      farmer.mobile.clone(),
      farmer.village.clone().unwrap_or_default(),
      farmer.crops.join(", "),
      farmer
        .income
        .map(|income| income.to_string())
        .unwrap_or_default(),
      farmer
        .credit_score
        .map(|score| score.to_string())
        .unwrap_or_default(),
      if farmer.assigned_executive.is_some() { "yes" } else { "no" }.to_owned(),
    ]);
  }
  report
}
