//! Error types for `krishi-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{application::ApplicationStatus, request::RequestStatus};

#[derive(Debug, Error)]
pub enum Error {
  #[error("admin not found: {0}")]
  AdminNotFound(Uuid),

  #[error("executive not found: {0}")]
  ExecutiveNotFound(Uuid),

  #[error("farmer not found: {0}")]
  FarmerNotFound(Uuid),

  #[error("request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("scheme not found: {0}")]
  SchemeNotFound(Uuid),

  #[error("application not found: {0}")]
  ApplicationNotFound(Uuid),

  #[error("document {document} not found on application {application}")]
  DocumentNotFound { application: Uuid, document: Uuid },

  #[error("duplicate {field}: {value:?}")]
  Duplicate { field: &'static str, value: String },

  #[error("farmer {farmer} already has an open application for scheme {scheme}")]
  DuplicateApplication { farmer: Uuid, scheme: Uuid },

  #[error("request cannot move from {from} to {to}")]
  InvalidRequestTransition {
    from: RequestStatus,
    to:   RequestStatus,
  },

  #[error("application cannot move from {from} to {to}")]
  InvalidApplicationTransition {
    from: ApplicationStatus,
    to:   ApplicationStatus,
  },

  #[error("request {0} is already claimed")]
  RequestAlreadyClaimed(Uuid),

  #[error("request {id} is not claimable while {status}")]
  RequestNotClaimable { id: Uuid, status: RequestStatus },

  #[error("request {id} can only be edited while pending (currently {status})")]
  RequestNotEditable { id: Uuid, status: RequestStatus },

  #[error("executive {id} still has {farmers} assigned farmer(s)")]
  ExecutiveHasFarmers { id: Uuid, farmers: u64 },

  #[error("farmer {farmer} is not assigned to executive {executive}")]
  FarmerNotAssigned { farmer: Uuid, executive: Uuid },

  #[error("scheme {id} has {applications} application(s) on file")]
  SchemeInUse { id: Uuid, applications: u64 },

  #[error("unknown {kind}: {value:?}")]
  UnknownValue {
    kind:  &'static str,
    value: String,
  },

  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
