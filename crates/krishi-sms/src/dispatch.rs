//! Sequential, throttled, best-effort dispatch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_number;

/// Provider and pacing configuration.
///
/// With `provider_url` unset the dispatcher runs in simulated mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
  pub provider_url:  Option<String>,
  pub api_key:       Option<String>,
  pub sender_id:     Option<String>,
  /// Country code applied to bare subscriber numbers.
  pub country_code:  String,
  /// Pause between consecutive sends, in milliseconds.
  pub send_delay_ms: u64,
  /// Per-request provider timeout, in seconds.
  pub timeout_secs:  u64,
}

impl Default for SmsConfig {
  fn default() -> Self {
    Self {
      provider_url:  None,
      api_key:       None,
      sender_id:     None,
      country_code:  "+91".into(),
      send_delay_ms: 200,
      timeout_secs:  10,
    }
  }
}

/// Terminal state of one recipient within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
  Sent,
  Failed,
}

/// Outcome for a single recipient. `number` is the normalized form where
/// normalization succeeded, the input as submitted otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
  pub number: String,
  pub status: SendStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:  Option<String>,
}

impl SendOutcome {
  fn sent(number: String) -> Self {
    Self {
      number,
      status: SendStatus::Sent,
      error: None,
    }
  }

  fn failed(number: String, error: impl Into<String>) -> Self {
    Self {
      number,
      status: SendStatus::Failed,
      error: Some(error.into()),
    }
  }
}

/// Aggregate outcome of one bulk dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
  pub sent:      u32,
  pub failed:    u32,
  /// True when the batch ran without touching a provider.
  pub simulated: bool,
  pub results:   Vec<SendOutcome>,
}

/// Sends one batch at a time: normalize, throttle, POST (or simulate),
/// collect. A failing recipient never aborts the batch.
#[derive(Debug, Clone)]
pub struct Dispatcher {
  client: reqwest::Client,
  config: SmsConfig,
}

impl Dispatcher {
  pub fn new(config: SmsConfig) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  /// True when no provider is configured and every send is simulated.
  pub fn is_simulated(&self) -> bool {
    self.config.provider_url.is_none()
  }

  /// Send `message` to every number in order, pausing the configured
  /// delay between consecutive recipients.
  pub async fn send_bulk(&self, message: &str, numbers: &[String]) -> BulkReport {
    self.dispatch(message, numbers, false).await
  }

  /// Run the batch in simulated mode regardless of configuration; used
  /// when dispatch is administratively disabled.
  pub async fn simulate_bulk(&self, message: &str, numbers: &[String]) -> BulkReport {
    self.dispatch(message, numbers, true).await
  }

  async fn dispatch(
    &self,
    message: &str,
    numbers: &[String],
    force_simulated: bool,
  ) -> BulkReport {
    let provider = if force_simulated {
      None
    } else {
      self.config.provider_url.as_deref()
    };
    let delay = Duration::from_millis(self.config.send_delay_ms);
    let mut results = Vec::with_capacity(numbers.len());

    for (index, raw) in numbers.iter().enumerate() {
      if index > 0 && !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }
      let number = match normalize_number(raw, &self.config.country_code) {
        Some(number) => number,
        None => {
          tracing::warn!(number = %raw, "dropping unreadable recipient");
          results.push(SendOutcome::failed(raw.clone(), "unreadable number"));
          continue;
        }
      };
      results.push(match provider {
        None => SendOutcome::sent(number),
        Some(url) => self.send_one(url, message, number).await,
      });
    }

    let sent = results
      .iter()
      .filter(|r| r.status == SendStatus::Sent)
      .count() as u32;
    BulkReport {
      sent,
      failed: results.len() as u32 - sent,
      simulated: provider.is_none(),
      results,
    }
  }

  async fn send_one(&self, url: &str, message: &str, number: String) -> SendOutcome {
    let payload = ProviderPayload {
      to:        &number,
      message,
      sender_id: self.config.sender_id.as_deref(),
    };
    let mut request = self.client.post(url).json(&payload);
    if let Some(key) = &self.config.api_key {
      request = request.bearer_auth(key);
    }
    match request.send().await {
      Ok(response) if response.status().is_success() => SendOutcome::sent(number),
      Ok(response) => {
        let status = response.status();
        tracing::warn!(%number, %status, "provider rejected message");
        SendOutcome::failed(number, format!("provider returned {status}"))
      }
      Err(err) => {
        tracing::warn!(%number, error = %err, "provider request failed");
        SendOutcome::failed(number, err.to_string())
      }
    }
  }
}

#[derive(Serialize)]
struct ProviderPayload<'a> {
  to:        &'a str,
  message:   &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  sender_id: Option<&'a str>,
}
