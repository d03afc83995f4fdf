//! Executive portal routes, mounted under `/api/executive`.
//!
//! - `GET|PUT /profile` — own account
//! - `GET|POST /farmers`, `GET|PUT /farmers/{id}`,
//!   `PUT /farmers/{id}/field-status` — the executive's assigned farmers
//! - `GET /requests`, `POST /requests/{id}/claim`,
//!   `PUT /requests/{id}/status`, `POST /requests/{id}/comments` — the
//!   request queue (assigned plus unassigned pending)
//! - `POST /sms`, `GET /sms/log` — bulk SMS to farmers
//! - `GET /reports/farmers` — assigned-farmer register as a PDF attachment
//!
//! Farmer-scoped routes return 403 unless the farmer is assigned to the
//! calling executive.

use axum::{
  Json, Router,
  extract::{Path, State},
  http::StatusCode,
  response::Response,
  routing::{get, post, put},
};
use chrono::Utc;
use krishi_core::{
  executive::{Executive, ExecutiveUpdate, NewSmsLogEntry, SmsLogEntry},
  farmer::{Farmer, FarmerUpdate, Gender, NewFarmer},
  field_status::{FieldHealth, FieldStatus},
  request::{Request, RequestComment, RequestStatus},
  role::{Actor, Role},
  store::PortalStore,
};
use krishi_sms::BulkReport;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{ExecutiveUser, check_new_password, hash_password},
  error::{ApiError, JsonBody, require},
};

pub fn routes<S>() -> Router<AppState<S>>
where
  S: PortalStore + Clone + 'static,
{
  Router::new()
    .route("/profile", get(profile).put(update_profile::<S>))
    .route("/farmers", get(list_farmers::<S>).post(create_farmer::<S>))
    .route("/farmers/{id}", get(get_farmer::<S>).put(update_farmer::<S>))
    .route("/farmers/{id}/field-status", put(upsert_field_status::<S>))
    .route("/requests", get(list_requests::<S>))
    .route("/requests/{id}/claim", post(claim_request::<S>))
    .route("/requests/{id}/status", put(transition_request::<S>))
    .route("/requests/{id}/comments", post(comment_request::<S>))
    .route("/sms", post(send_sms::<S>))
    .route("/sms/log", get(sms_log::<S>))
    .route("/reports/farmers", get(farmers_report::<S>))
}

/// Load a farmer and check they are assigned to the calling executive.
async fn owned_farmer<S>(
  state: &AppState<S>,
  executive_id: Uuid,
  farmer_id: Uuid,
) -> Result<Farmer, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let farmer = state
    .store
    .get_farmer(farmer_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("farmer {farmer_id} not found")))?;
  if farmer.assigned_executive != Some(executive_id) {
    return Err(ApiError::Forbidden);
  }
  Ok(farmer)
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /api/executive/profile`
pub async fn profile(ExecutiveUser(executive): ExecutiveUser) -> Json<Executive> {
  Json(executive)
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileBody {
  pub name:   Option<String>,
  pub mobile: Option<String>,
  pub region: Option<String>,
}

/// `PUT /api/executive/profile`
pub async fn update_profile<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  JsonBody(body): JsonBody<UpdateProfileBody>,
) -> Result<Json<Executive>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let updated = state
    .store
    .update_executive(executive.executive_id, ExecutiveUpdate {
      name:   body.name,
      mobile: body.mobile,
      region: body.region,
    })
    .await?;
  Ok(Json(updated))
}

// ─── Farmers ─────────────────────────────────────────────────────────────────

/// `GET /api/executive/farmers`
pub async fn list_farmers<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
) -> Result<Json<Vec<Farmer>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let farmers = state
    .store
    .list_farmers_for_executive(executive.executive_id)
    .await?;
  Ok(Json(farmers))
}

#[derive(Debug, Deserialize)]
pub struct CreateFarmerBody {
  pub name:             String,
  pub mobile:           String,
  pub password:         String,
  pub village:          Option<String>,
  pub panchayat:        Option<String>,
  pub caste:            Option<String>,
  pub gender:           Option<Gender>,
  pub income:           Option<i64>,
  pub estimated_income: Option<i64>,
  pub credit_score:     Option<u32>,
  #[serde(default)]
  pub crops:            Vec<String>,
}

/// `POST /api/executive/farmers` — registers a farmer assigned to the
/// calling executive. The mobile number is stored normalised and becomes
/// the farmer's login identifier.
pub async fn create_farmer<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  JsonBody(body): JsonBody<CreateFarmerBody>,
) -> Result<(StatusCode, Json<Farmer>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("name", &body.name)?;
  check_new_password(&body.password)?;
  let mobile = krishi_sms::normalize_number(&body.mobile, &state.config.sms.country_code)
    .ok_or(ApiError::Validation {
      field:   "mobile",
      message: "not a valid phone number".to_owned(),
    })?;

  let farmer = state
    .store
    .create_farmer(NewFarmer {
      name:               body.name,
      mobile,
      village:            body.village,
      panchayat:          body.panchayat,
      caste:              body.caste,
      gender:             body.gender,
      income:             body.income,
      estimated_income:   body.estimated_income,
      credit_score:       body.credit_score,
      crops:              body.crops,
      assigned_executive: Some(executive.executive_id),
      password_hash:      hash_password(&body.password)?,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(farmer)))
}

/// `GET /api/executive/farmers/{id}`
pub async fn get_farmer<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let farmer = owned_farmer(&state, executive.executive_id, id).await?;
  Ok(Json(farmer))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateFarmerBody {
  pub name:             Option<String>,
  pub village:          Option<String>,
  pub panchayat:        Option<String>,
  pub caste:            Option<String>,
  pub gender:           Option<Gender>,
  pub income:           Option<i64>,
  pub estimated_income: Option<i64>,
  pub credit_score:     Option<u32>,
  pub crops:            Option<Vec<String>>,
}

/// `PUT /api/executive/farmers/{id}`
pub async fn update_farmer<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<UpdateFarmerBody>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  owned_farmer(&state, executive.executive_id, id).await?;
  let farmer = state
    .store
    .update_farmer(id, FarmerUpdate {
      name:             body.name,
      village:          body.village,
      panchayat:        body.panchayat,
      caste:            body.caste,
      gender:           body.gender,
      income:           body.income,
      estimated_income: body.estimated_income,
      credit_score:     body.credit_score,
      crops:            body.crops,
    })
    .await?;
  Ok(Json(farmer))
}

#[derive(Debug, Deserialize)]
pub struct FieldStatusBody {
  pub health: FieldHealth,
  pub notes:  Option<String>,
}

/// `PUT /api/executive/farmers/{id}/field-status` — create or overwrite the
/// farmer's field condition.
pub async fn upsert_field_status<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<FieldStatusBody>,
) -> Result<Json<FieldStatus>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  owned_farmer(&state, executive.executive_id, id).await?;
  let status = state
    .store
    .upsert_field_status(id, body.health, body.notes)
    .await?;
  Ok(Json(status))
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// `GET /api/executive/requests` — requests assigned to the executive plus
/// unassigned pending ones available to claim.
pub async fn list_requests<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
) -> Result<Json<Vec<Request>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let requests = state
    .store
    .list_requests_for_executive(executive.executive_id)
    .await?;
  Ok(Json(requests))
}

/// `POST /api/executive/requests/{id}/claim` — atomically assigns the
/// request and moves it to `in-progress`.
pub async fn claim_request<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Request>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let request = state
    .store
    .claim_request(id, executive.executive_id)
    .await?;
  Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct RequestStatusBody {
  pub status: RequestStatus,
}

/// `PUT /api/executive/requests/{id}/status` — only the assigned executive
/// may transition a request.
pub async fn transition_request<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<RequestStatusBody>,
) -> Result<Json<Request>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let detail = state
    .store
    .get_request(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("request {id} not found")))?;
  if detail.request.assigned_executive != Some(executive.executive_id) {
    return Err(ApiError::Forbidden);
  }
  Ok(Json(state.store.transition_request(id, body.status).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `POST /api/executive/requests/{id}/comments`
pub async fn comment_request<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<CommentBody>,
) -> Result<(StatusCode, Json<RequestComment>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("body", &body.body)?;
  let detail = state
    .store
    .get_request(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("request {id} not found")))?;
  if detail.request.assigned_executive != Some(executive.executive_id) {
    return Err(ApiError::Forbidden);
  }
  let comment = state
    .store
    .add_request_comment(
      id,
      Actor::new(Role::Executive, executive.executive_id),
      body.body,
    )
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── SMS ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SmsBody {
  pub message:             String,
  /// Explicit recipient numbers, in any readable format.
  #[serde(default)]
  pub numbers:             Vec<String>,
  /// Also include every farmer assigned to the calling executive.
  #[serde(default)]
  pub to_assigned_farmers: bool,
}

/// `POST /api/executive/sms` — dispatch a bulk SMS batch and append the
/// outcome to the executive's log. Runs simulated while `sms_enabled` is
/// off in settings or no provider is configured.
pub async fn send_sms<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
  JsonBody(body): JsonBody<SmsBody>,
) -> Result<Json<BulkReport>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("message", &body.message)?;

  let mut numbers = body.numbers;
  if body.to_assigned_farmers {
    let farmers = state
      .store
      .list_farmers_for_executive(executive.executive_id)
      .await?;
    numbers.extend(farmers.into_iter().map(|farmer| farmer.mobile));
  }
  if numbers.is_empty() {
    return Err(ApiError::Validation {
      field:   "numbers",
      message: "no recipients given".to_owned(),
    });
  }

  let settings = state.store.settings().await?;
  let report = if settings.sms_enabled {
    state.sms.send_bulk(&body.message, &numbers).await
  } else {
    state.sms.simulate_bulk(&body.message, &numbers).await
  };

  state
    .store
    .append_sms_log(NewSmsLogEntry {
      executive_id: executive.executive_id,
      message:      body.message,
      recipients:   report.results.iter().map(|r| r.number.clone()).collect(),
      sent:         report.sent,
      failed:       report.failed,
      simulated:    report.simulated,
    })
    .await?;

  Ok(Json(report))
}

/// `GET /api/executive/sms/log`
pub async fn sms_log<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
) -> Result<Json<Vec<SmsLogEntry>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.list_sms_log(executive.executive_id).await?))
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// `GET /api/executive/reports/farmers` — the executive's assigned farmers
/// as a PDF register.
pub async fn farmers_report<S>(
  State(state): State<AppState<S>>,
  ExecutiveUser(executive): ExecutiveUser,
) -> Result<Response, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let farmers = state
    .store
    .list_farmers_for_executive(executive.executive_id)
    .await?;
  let report = krishi_report::farmer_register(&farmers, Utc::now());
  Ok(crate::pdf_attachment(
    report,
    state.config.report_rows_per_page,
    "assigned-farmers.pdf",
  ))
}
