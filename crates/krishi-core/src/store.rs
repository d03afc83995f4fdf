//! The `PortalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `krishi-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.
//!
//! All methods return [`crate::Result`] so guard failures (state-machine
//! violations, uniqueness conflicts, delete guards) surface as domain errors
//! that one central place can translate into HTTP statuses.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  analytics::{ApplicationStats, FarmerStats, RequestStats, SchemeStats},
  application::{
    ApplicationDetail, ApplicationStatus, DocumentVerification, NewApplication,
    SchemeApplication,
  },
  executive::{Executive, ExecutiveUpdate, NewExecutive, NewSmsLogEntry, SmsLogEntry},
  farmer::{Farmer, FarmerUpdate, FieldPhoto, NewFarmer, NewFieldPhoto},
  field_status::{FieldHealth, FieldStatus},
  principal::{Admin, NewAdmin, Principal},
  request::{NewRequest, Request, RequestComment, RequestDetail, RequestStatus, RequestUpdate},
  role::{Actor, Role},
  scheme::{GovernmentScheme, NewScheme, SchemeStatus, SchemeUpdate},
  settings::{Settings, SettingsUpdate},
};

/// Abstraction over a portal storage backend.
///
/// Multi-row operations (cascade deletes, delete guards, application
/// creation, workflow transitions) are atomic: either every row change
/// commits or none does. Audit trails (comments, application history, the
/// SMS log) are append-only; no method ever mutates or removes their rows.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PortalStore: Send + Sync {
  // ── Principals ────────────────────────────────────────────────────────

  /// Look up a principal by role and login identifier (username for admins,
  /// email for executives, mobile for farmers). Returns `None` if no such
  /// principal exists.
  fn find_principal(
    &self,
    role: Role,
    identifier: String,
  ) -> impl Future<Output = Result<Option<Principal>>> + Send + '_;

  /// Resolve a principal by role and id — the token-verification path.
  /// Returns `None` if the principal has been deleted since token issuance.
  fn get_principal(
    &self,
    role: Role,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Principal>>> + Send + '_;

  // ── Admins ────────────────────────────────────────────────────────────

  /// Create an admin account. Fails if the username is taken.
  fn create_admin(
    &self,
    input: NewAdmin,
  ) -> impl Future<Output = Result<Admin>> + Send + '_;

  /// Insert an admin account if the username is free; the startup
  /// bootstrap path. Returns the created account, or `None` if an account
  /// with that username already existed (which is left untouched).
  fn ensure_admin(
    &self,
    input: NewAdmin,
  ) -> impl Future<Output = Result<Option<Admin>>> + Send + '_;

  // ── Executives ────────────────────────────────────────────────────────

  /// Create an executive account. Fails if the email is taken.
  fn create_executive(
    &self,
    input: NewExecutive,
  ) -> impl Future<Output = Result<Executive>> + Send + '_;

  fn get_executive(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Executive>>> + Send + '_;

  fn list_executives(
    &self,
  ) -> impl Future<Output = Result<Vec<Executive>>> + Send + '_;

  fn update_executive(
    &self,
    id: Uuid,
    update: ExecutiveUpdate,
  ) -> impl Future<Output = Result<Executive>> + Send + '_;

  /// Delete an executive. Fails with
  /// [`crate::Error::ExecutiveHasFarmers`] while any farmer is assigned to
  /// them; nothing is modified on failure. Requests they had claimed
  /// become unassigned.
  fn delete_executive(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Append one dispatch outcome to an executive's SMS log.
  fn append_sms_log(
    &self,
    input: NewSmsLogEntry,
  ) -> impl Future<Output = Result<SmsLogEntry>> + Send + '_;

  /// An executive's SMS log, most recent first.
  fn list_sms_log(
    &self,
    executive_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SmsLogEntry>>> + Send + '_;

  // ── Farmers ───────────────────────────────────────────────────────────

  /// Create a farmer profile. Fails if the mobile number is taken.
  fn create_farmer(
    &self,
    input: NewFarmer,
  ) -> impl Future<Output = Result<Farmer>> + Send + '_;

  fn get_farmer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Farmer>>> + Send + '_;

  fn list_farmers(&self) -> impl Future<Output = Result<Vec<Farmer>>> + Send + '_;

  /// Farmers assigned to the given executive.
  fn list_farmers_for_executive(
    &self,
    executive_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Farmer>>> + Send + '_;

  fn update_farmer(
    &self,
    id: Uuid,
    update: FarmerUpdate,
  ) -> impl Future<Output = Result<Farmer>> + Send + '_;

  /// Delete a farmer and, in the same transaction, their requests (with
  /// comments), scheme applications (with history and documents), field
  /// status, field photos, and saved-scheme bookmarks.
  fn delete_farmer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Point a farmer's `assigned_executive` at the given executive,
  /// replacing any previous assignment.
  fn assign_farmer(
    &self,
    farmer_id: Uuid,
    executive_id: Uuid,
  ) -> impl Future<Output = Result<Farmer>> + Send + '_;

  /// Clear a farmer's assignment. Fails with
  /// [`crate::Error::FarmerNotAssigned`] if the farmer is not currently
  /// assigned to that executive.
  fn unassign_farmer(
    &self,
    farmer_id: Uuid,
    executive_id: Uuid,
  ) -> impl Future<Output = Result<Farmer>> + Send + '_;

  /// Bookmark a scheme for a farmer. Idempotent.
  fn save_scheme(
    &self,
    farmer_id: Uuid,
    scheme_id: Uuid,
  ) -> impl Future<Output = Result<Farmer>> + Send + '_;

  /// Remove a scheme bookmark. Idempotent.
  fn unsave_scheme(
    &self,
    farmer_id: Uuid,
    scheme_id: Uuid,
  ) -> impl Future<Output = Result<Farmer>> + Send + '_;

  /// Record an uploaded field photo (the file itself lives on disk).
  fn add_field_photo(
    &self,
    input: NewFieldPhoto,
  ) -> impl Future<Output = Result<FieldPhoto>> + Send + '_;

  /// A farmer's field photos, most recent first.
  fn list_field_photos(
    &self,
    farmer_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FieldPhoto>>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Open a new request; it starts `pending` and unassigned.
  fn create_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// A request with its full comment trail. Returns `None` if not found.
  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RequestDetail>>> + Send + '_;

  /// All requests, optionally filtered by status. Newest first.
  fn list_requests(
    &self,
    status: Option<RequestStatus>,
  ) -> impl Future<Output = Result<Vec<Request>>> + Send + '_;

  /// A farmer's own requests, newest first.
  fn list_requests_for_farmer(
    &self,
    farmer_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Request>>> + Send + '_;

  /// The requests an executive works: those assigned to them plus
  /// unassigned pending ones available to claim. Newest first.
  fn list_requests_for_executive(
    &self,
    executive_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Request>>> + Send + '_;

  /// Claim an unassigned pending request for an executive: sets
  /// `assigned_executive` and moves the request to `in-progress`.
  fn claim_request(
    &self,
    request_id: Uuid,
    executive_id: Uuid,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// Apply a status transition. Fails with
  /// [`crate::Error::InvalidRequestTransition`] unless the transition table
  /// permits it. The first move into `resolved` stamps `resolved_at`.
  fn transition_request(
    &self,
    request_id: Uuid,
    next: RequestStatus,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// Edit a still-pending request. Fails with
  /// [`crate::Error::RequestNotEditable`] once worked on.
  fn update_request(
    &self,
    request_id: Uuid,
    update: RequestUpdate,
  ) -> impl Future<Output = Result<Request>> + Send + '_;

  /// Append a comment to a request's trail.
  fn add_request_comment(
    &self,
    request_id: Uuid,
    author: Actor,
    body: String,
  ) -> impl Future<Output = Result<RequestComment>> + Send + '_;

  // ── Schemes ───────────────────────────────────────────────────────────

  fn create_scheme(
    &self,
    input: NewScheme,
  ) -> impl Future<Output = Result<GovernmentScheme>> + Send + '_;

  fn get_scheme(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<GovernmentScheme>>> + Send + '_;

  /// Schemes, optionally filtered by status. Newest first.
  fn list_schemes(
    &self,
    status: Option<SchemeStatus>,
  ) -> impl Future<Output = Result<Vec<GovernmentScheme>>> + Send + '_;

  fn update_scheme(
    &self,
    id: Uuid,
    update: SchemeUpdate,
  ) -> impl Future<Output = Result<GovernmentScheme>> + Send + '_;

  /// Delete a scheme. Fails with [`crate::Error::SchemeInUse`] while any
  /// application references it (the review trail outlives the listing);
  /// bookmarks pointing at it are removed.
  fn delete_scheme(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Applications ──────────────────────────────────────────────────────

  /// Submit an application. In one transaction: enforces the at-most-one
  /// non-rejected application per `(farmer, scheme)` rule, issues the next
  /// `APP-YYYYMMDD-NNNN` reference for the day, inserts the documents, and
  /// appends the opening `pending` history entry.
  fn create_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<ApplicationDetail>> + Send + '_;

  fn get_application(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ApplicationDetail>>> + Send + '_;

  /// All applications, optionally filtered by status. Newest first.
  fn list_applications(
    &self,
    status: Option<ApplicationStatus>,
  ) -> impl Future<Output = Result<Vec<SchemeApplication>>> + Send + '_;

  /// A farmer's applications, newest first.
  fn list_applications_for_farmer(
    &self,
    farmer_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SchemeApplication>>> + Send + '_;

  /// Apply a review transition and append the history entry recording it.
  /// The first transition into `approved` or `rejected` stamps
  /// `reviewed_by` and `review_date`; they are never overwritten.
  fn transition_application(
    &self,
    id: Uuid,
    next: ApplicationStatus,
    actor: Actor,
    remarks: Option<String>,
  ) -> impl Future<Output = Result<ApplicationDetail>> + Send + '_;

  /// Apply a batch of document verifications. Each flag that actually
  /// changes appends a history entry (status unchanged); referencing an
  /// unknown document fails the whole batch.
  fn verify_documents(
    &self,
    id: Uuid,
    updates: Vec<DocumentVerification>,
    actor: Actor,
  ) -> impl Future<Output = Result<ApplicationDetail>> + Send + '_;

  // ── Field status ──────────────────────────────────────────────────────

  /// Create or overwrite the field status for a farmer.
  fn upsert_field_status(
    &self,
    farmer_id: Uuid,
    health: FieldHealth,
    notes: Option<String>,
  ) -> impl Future<Output = Result<FieldStatus>> + Send + '_;

  fn get_field_status(
    &self,
    farmer_id: Uuid,
  ) -> impl Future<Output = Result<Option<FieldStatus>>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  /// The settings singleton, created with defaults on first read.
  fn settings(&self) -> impl Future<Output = Result<Settings>> + Send + '_;

  fn update_settings(
    &self,
    update: SettingsUpdate,
  ) -> impl Future<Output = Result<Settings>> + Send + '_;

  // ── Analytics ─────────────────────────────────────────────────────────

  fn farmer_stats(&self) -> impl Future<Output = Result<FarmerStats>> + Send + '_;

  fn executive_count(&self) -> impl Future<Output = Result<u64>> + Send + '_;

  fn request_stats(
    &self,
  ) -> impl Future<Output = Result<RequestStats>> + Send + '_;

  fn scheme_stats(&self) -> impl Future<Output = Result<SchemeStats>> + Send + '_;

  fn application_stats(
    &self,
  ) -> impl Future<Output = Result<ApplicationStats>> + Send + '_;
}
