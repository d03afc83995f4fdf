//! Government schemes published to farmers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication state of a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeStatus {
  Active,
  Inactive,
  Upcoming,
}

impl SchemeStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Inactive => "inactive",
      Self::Upcoming => "upcoming",
    }
  }
}

impl std::fmt::Display for SchemeStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for SchemeStatus {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "active" => Ok(Self::Active),
      "inactive" => Ok(Self::Inactive),
      "upcoming" => Ok(Self::Upcoming),
      other => Err(crate::Error::UnknownValue {
        kind:  "scheme status",
        value: other.to_owned(),
      }),
    }
  }
}

/// Editorial judgement of how relevant a scheme is to the farmer base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
  High,
  #[default]
  Medium,
  Low,
}

impl Relevance {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::High => "high",
      Self::Medium => "medium",
      Self::Low => "low",
    }
  }
}

impl std::fmt::Display for Relevance {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Relevance {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "high" => Ok(Self::High),
      "medium" => Ok(Self::Medium),
      "low" => Ok(Self::Low),
      other => Err(crate::Error::UnknownValue {
        kind:  "relevance",
        value: other.to_owned(),
      }),
    }
  }
}

/// A government scheme. The list-valued fields are ordered lists of short
/// lines (eligibility criteria, benefit bullet points, and so on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernmentScheme {
  pub scheme_id:            Uuid,
  pub title:                String,
  pub category:             Option<String>,
  pub description:          String,
  pub eligibility:          Vec<String>,
  pub benefits:             Vec<String>,
  pub application_process:  Vec<String>,
  pub required_documents:   Vec<String>,
  pub application_deadline: Option<NaiveDate>,
  pub contact_info:         Option<String>,
  pub status:               SchemeStatus,
  pub relevance:            Relevance,
  pub created_at:           DateTime<Utc>,
}

/// Input to [`crate::store::PortalStore::create_scheme`].
#[derive(Debug, Clone)]
pub struct NewScheme {
  pub title:                String,
  pub category:             Option<String>,
  pub description:          String,
  pub eligibility:          Vec<String>,
  pub benefits:             Vec<String>,
  pub application_process:  Vec<String>,
  pub required_documents:   Vec<String>,
  pub application_deadline: Option<NaiveDate>,
  pub contact_info:         Option<String>,
  pub status:               SchemeStatus,
  pub relevance:            Relevance,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct SchemeUpdate {
  pub title:                Option<String>,
  pub category:             Option<String>,
  pub description:          Option<String>,
  pub eligibility:          Option<Vec<String>>,
  pub benefits:             Option<Vec<String>>,
  pub application_process:  Option<Vec<String>>,
  pub required_documents:   Option<Vec<String>>,
  pub application_deadline: Option<NaiveDate>,
  pub contact_info:         Option<String>,
  pub status:               Option<SchemeStatus>,
  pub relevance:            Option<Relevance>,
}

/// Accepts a scheme list field as either a JSON array of strings or one
/// newline-separated block of text; admin tooling submits both shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
  Many(Vec<String>),
  Text(String),
}

impl ListInput {
  /// Normalise to an ordered list: items are trimmed and empties dropped;
  /// text is split on newlines first. Reading the field back always yields
  /// this normalised form.
  pub fn into_list(self) -> Vec<String> {
    let items: Vec<String> = match self {
      Self::Many(items) => items,
      Self::Text(text) => text.lines().map(str::to_owned).collect(),
    };
    items
      .into_iter()
      .map(|item| item.trim().to_owned())
      .filter(|item| !item.is_empty())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn newline_text_splits_into_ordered_list() {
    let input = ListInput::Text(
      "Landholding below 2 hectares\n\n  Aadhaar-seeded bank account  \nNo prior benefit drawn\n".to_owned(),
    );
    assert_eq!(input.into_list(), vec![
      "Landholding below 2 hectares".to_owned(),
      "Aadhaar-seeded bank account".to_owned(),
      "No prior benefit drawn".to_owned(),
    ]);
  }

  #[test]
  fn array_input_passes_through_trimmed() {
    let input = ListInput::Many(vec![
      " Soil health card ".to_owned(),
      String::new(),
      "Crop insurance".to_owned(),
    ]);
    assert_eq!(input.into_list(), vec![
      "Soil health card".to_owned(),
      "Crop insurance".to_owned(),
    ]);
  }

  #[test]
  fn json_decodes_both_shapes() {
    let from_text: ListInput =
      serde_json::from_str("\"a\\nb\"").unwrap();
    let from_array: ListInput =
      serde_json::from_str("[\"a\", \"b\"]").unwrap();
    assert_eq!(from_text.into_list(), from_array.into_list());
  }
}
