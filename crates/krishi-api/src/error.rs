//! The API error taxonomy and its HTTP mapping.
//!
//! Every handler returns [`ApiError`]; domain errors funnel through one
//! [`From`] impl so a given failure maps to the same status and body no
//! matter which route surfaced it. Responses are always
//! `{"error": "..."}`, with a `field` key added when the failure names one.

use axum::{
  Json,
  extract::{FromRequest, Request},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use krishi_core::Error as DomainError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// Malformed input that names no particular field.
  #[error("{0}")]
  BadRequest(String),

  /// A named field failed validation.
  #[error("invalid {field}: {message}")]
  Validation { field: &'static str, message: String },

  /// A named field collides with an existing record.
  #[error("{message}")]
  Duplicate { field: &'static str, message: String },

  #[error("{0}")]
  Unauthorized(&'static str),

  /// Authenticated, but the route or record belongs to someone else.
  #[error("forbidden")]
  Forbidden,

  #[error("{0}")]
  NotFound(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_)
      | ApiError::Validation { .. }
      | ApiError::Duplicate { .. } => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Validation { field, message } => {
        json!({ "error": message, "field": field })
      }
      ApiError::Duplicate { field, message } => {
        json!({ "error": message, "field": field })
      }
      other => json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}

impl From<DomainError> for ApiError {
  fn from(err: DomainError) -> Self {
    let message = err.to_string();
    match err {
      DomainError::AdminNotFound(_)
      | DomainError::ExecutiveNotFound(_)
      | DomainError::FarmerNotFound(_)
      | DomainError::RequestNotFound(_)
      | DomainError::SchemeNotFound(_)
      | DomainError::ApplicationNotFound(_)
      | DomainError::DocumentNotFound { .. } => ApiError::NotFound(message),

      DomainError::Duplicate { field, .. } => ApiError::Duplicate { field, message },
      DomainError::DuplicateApplication { .. } => ApiError::Duplicate {
        field: "application",
        message,
      },

      DomainError::InvalidRequestTransition { .. }
      | DomainError::InvalidApplicationTransition { .. }
      | DomainError::RequestAlreadyClaimed(_)
      | DomainError::RequestNotClaimable { .. }
      | DomainError::RequestNotEditable { .. }
      | DomainError::ExecutiveHasFarmers { .. }
      | DomainError::FarmerNotAssigned { .. }
      | DomainError::SchemeInUse { .. }
      | DomainError::UnknownValue { .. } => ApiError::BadRequest(message),

      DomainError::Validation { field, message } => ApiError::Validation { field, message },

      DomainError::Serialization(_) | DomainError::Storage(_) => ApiError::Internal(message),
    }
  }
}

/// Reject an empty or whitespace-only required field.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::Validation {
      field,
      message: "must not be empty".to_owned(),
    });
  }
  Ok(())
}

/// JSON body extractor whose rejections use the taxonomy above.
///
/// axum's own [`Json`] rejects undeserialisable bodies with 422; the portal
/// contract wants every malformed input as a 400 `{"error"}` instead.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
  T: serde::de::DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(Self(value)),
      Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn domain_errors_map_to_their_statuses() {
    let id = Uuid::new_v4();
    let cases: Vec<(DomainError, StatusCode)> = vec![
      (DomainError::FarmerNotFound(id), StatusCode::NOT_FOUND),
      (
        DomainError::Duplicate {
          field: "email",
          value: "a@b.example".into(),
        },
        StatusCode::BAD_REQUEST,
      ),
      (
        DomainError::RequestAlreadyClaimed(id),
        StatusCode::BAD_REQUEST,
      ),
      (
        DomainError::Validation {
          field:   "title",
          message: "must not be empty".into(),
        },
        StatusCode::BAD_REQUEST,
      ),
      (
        DomainError::Storage("disk full".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (domain, expected) in cases {
      let api = ApiError::from(domain);
      assert_eq!(api.status(), expected, "{api}");
    }
  }

  #[test]
  fn field_errors_carry_the_field_name() {
    let api = ApiError::from(DomainError::Duplicate {
      field: "mobile",
      value: "+919812345678".into(),
    });
    match api {
      ApiError::Duplicate { field, .. } => assert_eq!(field, "mobile"),
      other => panic!("unexpected mapping: {other}"),
    }
  }
}
