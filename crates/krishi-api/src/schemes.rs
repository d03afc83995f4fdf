//! Scheme management routes, mounted under `/api/scheme-management`.
//!
//! - `GET|POST /schemes`, `GET|PUT|DELETE /schemes/{id}` — the scheme
//!   catalogue
//! - `GET /applications[?status=]`, `GET /applications/{id}` — review queue
//! - `PUT /applications/{id}/status` — review transitions with remarks
//! - `PUT /applications/{id}/documents` — per-document verification flags
//!
//! Admin-only. List-valued scheme fields accept either a JSON array or one
//! newline-separated text block and always read back as arrays.

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::StatusCode,
  routing::{get, put},
};
use chrono::NaiveDate;
use krishi_core::{
  application::{
    ApplicationDetail, ApplicationStatus, DocumentVerification, SchemeApplication,
  },
  role::{Actor, Role},
  scheme::{
    GovernmentScheme, ListInput, NewScheme, Relevance, SchemeStatus, SchemeUpdate,
  },
  store::PortalStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::AdminUser,
  error::{ApiError, JsonBody, require},
};

pub fn routes<S>() -> Router<AppState<S>>
where
  S: PortalStore + Clone + 'static,
{
  Router::new()
    .route("/schemes", get(list_schemes::<S>).post(create_scheme::<S>))
    .route(
      "/schemes/{id}",
      get(get_scheme::<S>)
        .put(update_scheme::<S>)
        .delete(delete_scheme::<S>),
    )
    .route("/applications", get(list_applications::<S>))
    .route("/applications/{id}", get(get_application::<S>))
    .route("/applications/{id}/status", put(transition_application::<S>))
    .route("/applications/{id}/documents", put(verify_documents::<S>))
}

// ─── Schemes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct StatusFilter {
  pub status: Option<String>,
}

/// `GET /api/scheme-management/schemes?status=`
pub async fn list_schemes<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<GovernmentScheme>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let status = filter
    .status
    .as_deref()
    .map(str::parse::<SchemeStatus>)
    .transpose()?;
  Ok(Json(state.store.list_schemes(status).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateSchemeBody {
  pub title:                String,
  pub description:          String,
  pub category:             Option<String>,
  pub eligibility:          Option<ListInput>,
  pub benefits:             Option<ListInput>,
  pub application_process:  Option<ListInput>,
  pub required_documents:   Option<ListInput>,
  pub application_deadline: Option<NaiveDate>,
  pub contact_info:         Option<String>,
  pub status:               Option<SchemeStatus>,
  pub relevance:            Option<Relevance>,
}

/// `POST /api/scheme-management/schemes` — new schemes default to `active`
/// and `medium` relevance.
pub async fn create_scheme<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  JsonBody(body): JsonBody<CreateSchemeBody>,
) -> Result<(StatusCode, Json<GovernmentScheme>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("title", &body.title)?;
  require("description", &body.description)?;
  let scheme = state
    .store
    .create_scheme(NewScheme {
      title:                body.title,
      category:             body.category,
      description:          body.description,
      eligibility:          body.eligibility.map(ListInput::into_list).unwrap_or_default(),
      benefits:             body.benefits.map(ListInput::into_list).unwrap_or_default(),
      application_process:  body
        .application_process
        .map(ListInput::into_list)
        .unwrap_or_default(),
      required_documents:   body
        .required_documents
        .map(ListInput::into_list)
        .unwrap_or_default(),
      application_deadline: body.application_deadline,
      contact_info:         body.contact_info,
      status:               body.status.unwrap_or(SchemeStatus::Active),
      relevance:            body.relevance.unwrap_or_default(),
    })
    .await?;
  Ok((StatusCode::CREATED, Json(scheme)))
}

/// `GET /api/scheme-management/schemes/{id}`
pub async fn get_scheme<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<GovernmentScheme>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let scheme = state
    .store
    .get_scheme(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("scheme {id} not found")))?;
  Ok(Json(scheme))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSchemeBody {
  pub title:                Option<String>,
  pub category:             Option<String>,
  pub description:          Option<String>,
  pub eligibility:          Option<ListInput>,
  pub benefits:             Option<ListInput>,
  pub application_process:  Option<ListInput>,
  pub required_documents:   Option<ListInput>,
  pub application_deadline: Option<NaiveDate>,
  pub contact_info:         Option<String>,
  pub status:               Option<SchemeStatus>,
  pub relevance:            Option<Relevance>,
}

/// `PUT /api/scheme-management/schemes/{id}`
pub async fn update_scheme<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<UpdateSchemeBody>,
) -> Result<Json<GovernmentScheme>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let scheme = state
    .store
    .update_scheme(id, SchemeUpdate {
      title:                body.title,
      category:             body.category,
      description:          body.description,
      eligibility:          body.eligibility.map(ListInput::into_list),
      benefits:             body.benefits.map(ListInput::into_list),
      application_process:  body.application_process.map(ListInput::into_list),
      required_documents:   body.required_documents.map(ListInput::into_list),
      application_deadline: body.application_deadline,
      contact_info:         body.contact_info,
      status:               body.status,
      relevance:            body.relevance,
    })
    .await?;
  Ok(Json(scheme))
}

/// `DELETE /api/scheme-management/schemes/{id}` — refused while any
/// application references the scheme.
pub async fn delete_scheme<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  state.store.delete_scheme(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Applications ────────────────────────────────────────────────────────────

/// `GET /api/scheme-management/applications?status=`
pub async fn list_applications<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<SchemeApplication>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let status = filter
    .status
    .as_deref()
    .map(str::parse::<ApplicationStatus>)
    .transpose()?;
  Ok(Json(state.store.list_applications(status).await?))
}

/// `GET /api/scheme-management/applications/{id}`
pub async fn get_application<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ApplicationDetail>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let detail = state
    .store
    .get_application(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;
  Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:  ApplicationStatus,
  pub remarks: Option<String>,
}

/// `PUT /api/scheme-management/applications/{id}/status` — applies a review
/// transition and appends the history entry recording it.
pub async fn transition_application<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<ReviewBody>,
) -> Result<Json<ApplicationDetail>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let detail = state
    .store
    .transition_application(
      id,
      body.status,
      Actor::new(Role::Admin, admin.admin_id),
      body.remarks,
    )
    .await?;
  Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct DocumentFlag {
  pub document_id: Uuid,
  pub verified:    bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyDocumentsBody {
  pub documents: Vec<DocumentFlag>,
}

/// `PUT /api/scheme-management/applications/{id}/documents` — flips
/// verification flags in one batch; an unknown document fails the whole
/// batch.
pub async fn verify_documents<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<VerifyDocumentsBody>,
) -> Result<Json<ApplicationDetail>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let updates = body
    .documents
    .into_iter()
    .map(|flag| DocumentVerification {
      document_id: flag.document_id,
      verified:    flag.verified,
    })
    .collect();
  let detail = state
    .store
    .verify_documents(id, updates, Actor::new(Role::Admin, admin.admin_id))
    .await?;
  Ok(Json(detail))
}
