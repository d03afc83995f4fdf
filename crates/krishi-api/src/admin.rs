//! Admin portal routes, mounted under `/api/admin`.
//!
//! - `GET|POST /executives`, `GET|PUT|DELETE /executives/{id}` — executive
//!   account management
//! - `PUT|DELETE /executives/{id}/farmers/{farmer_id}` — farmer assignment
//! - `GET /farmers`, `GET|DELETE /farmers/{id}` — the full farmer roster
//! - `GET /requests[?status=]`, `GET /requests/{id}`,
//!   `PUT /requests/{id}/status`, `POST /requests/{id}/comments` — request
//!   oversight across all farmers
//! - `GET /dashboard` — aggregate statistics
//! - `GET|PUT /settings` — the portal settings singleton
//! - `GET /reports/farmers` — the farmer register as a PDF attachment
//!
//! Every route requires an admin token; scheme management lives in
//! [`crate::schemes`].

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
  routing::{get, post, put},
};
use chrono::Utc;
use krishi_core::{
  analytics::DashboardStats,
  executive::{Executive, ExecutiveUpdate, NewExecutive},
  farmer::Farmer,
  request::{Request, RequestComment, RequestDetail, RequestStatus},
  role::{Actor, Role},
  settings::{NotificationTemplate, Settings, SettingsUpdate},
  store::PortalStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminUser, check_new_password, hash_password},
  error::{ApiError, JsonBody, require},
};

pub fn routes<S>() -> Router<AppState<S>>
where
  S: PortalStore + Clone + 'static,
{
  Router::new()
    .route(
      "/executives",
      get(list_executives::<S>).post(create_executive::<S>),
    )
    .route(
      "/executives/{id}",
      get(get_executive::<S>)
        .put(update_executive::<S>)
        .delete(delete_executive::<S>),
    )
    .route(
      "/executives/{id}/farmers/{farmer_id}",
      put(assign_farmer::<S>).delete(unassign_farmer::<S>),
    )
    .route("/farmers", get(list_farmers::<S>))
    .route(
      "/farmers/{id}",
      get(get_farmer::<S>).delete(delete_farmer::<S>),
    )
    .route("/requests", get(list_requests::<S>))
    .route("/requests/{id}", get(get_request::<S>))
    .route("/requests/{id}/status", put(transition_request::<S>))
    .route("/requests/{id}/comments", post(comment_request::<S>))
    .route("/dashboard", get(dashboard::<S>))
    .route("/settings", get(get_settings::<S>).put(update_settings::<S>))
    .route("/reports/farmers", get(farmers_report::<S>))
}

// ─── Executives ──────────────────────────────────────────────────────────────

/// `GET /api/admin/executives`
pub async fn list_executives<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<Executive>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.list_executives().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateExecutiveBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub mobile:   Option<String>,
  pub region:   Option<String>,
}

/// `POST /api/admin/executives`
pub async fn create_executive<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  JsonBody(body): JsonBody<CreateExecutiveBody>,
) -> Result<(StatusCode, Json<Executive>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("name", &body.name)?;
  require("email", &body.email)?;
  if !body.email.contains('@') {
    return Err(ApiError::Validation {
      field:   "email",
      message: "not an email address".to_owned(),
    });
  }
  check_new_password(&body.password)?;

  let executive = state
    .store
    .create_executive(NewExecutive {
      name:          body.name,
      email:         body.email,
      mobile:        body.mobile,
      region:        body.region,
      password_hash: hash_password(&body.password)?,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(executive)))
}

/// `GET /api/admin/executives/{id}`
pub async fn get_executive<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Executive>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let executive = state
    .store
    .get_executive(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("executive {id} not found")))?;
  Ok(Json(executive))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateExecutiveBody {
  pub name:   Option<String>,
  pub mobile: Option<String>,
  pub region: Option<String>,
}

/// `PUT /api/admin/executives/{id}`
pub async fn update_executive<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<UpdateExecutiveBody>,
) -> Result<Json<Executive>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let executive = state
    .store
    .update_executive(id, ExecutiveUpdate {
      name:   body.name,
      mobile: body.mobile,
      region: body.region,
    })
    .await?;
  Ok(Json(executive))
}

/// `DELETE /api/admin/executives/{id}` — refused while farmers remain
/// assigned.
pub async fn delete_executive<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  state.store.delete_executive(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/admin/executives/{id}/farmers/{farmer_id}`
pub async fn assign_farmer<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path((id, farmer_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.assign_farmer(farmer_id, id).await?))
}

/// `DELETE /api/admin/executives/{id}/farmers/{farmer_id}`
pub async fn unassign_farmer<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path((id, farmer_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.unassign_farmer(farmer_id, id).await?))
}

// ─── Farmers ─────────────────────────────────────────────────────────────────

/// `GET /api/admin/farmers`
pub async fn list_farmers<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Vec<Farmer>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.list_farmers().await?))
}

/// `GET /api/admin/farmers/{id}`
pub async fn get_farmer<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let farmer = state
    .store
    .get_farmer(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("farmer {id} not found")))?;
  Ok(Json(farmer))
}

/// `DELETE /api/admin/farmers/{id}` — cascades to the farmer's requests,
/// applications, field status, photos, and bookmarks.
pub async fn delete_farmer<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  state.store.delete_farmer(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct StatusFilter {
  pub status: Option<String>,
}

/// `GET /api/admin/requests?status=`
pub async fn list_requests<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<Request>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let status = filter
    .status
    .as_deref()
    .map(str::parse::<RequestStatus>)
    .transpose()?;
  Ok(Json(state.store.list_requests(status).await?))
}

/// `GET /api/admin/requests/{id}`
pub async fn get_request<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<RequestDetail>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let detail = state
    .store
    .get_request(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("request {id} not found")))?;
  Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct RequestStatusBody {
  pub status: RequestStatus,
}

/// `PUT /api/admin/requests/{id}/status` — admins may transition any
/// request, claimed or not.
pub async fn transition_request<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<RequestStatusBody>,
) -> Result<Json<Request>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.transition_request(id, body.status).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `POST /api/admin/requests/{id}/comments`
pub async fn comment_request<S>(
  State(state): State<AppState<S>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<CommentBody>,
) -> Result<(StatusCode, Json<RequestComment>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("body", &body.body)?;
  let comment = state
    .store
    .add_request_comment(id, Actor::new(Role::Admin, admin.admin_id), body.body)
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Dashboard and settings ──────────────────────────────────────────────────

/// `GET /api/admin/dashboard` — every figure is derived from stored rows;
/// metrics with no data source yet are served as explicit nulls under
/// `not_derived`, never fabricated.
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<DashboardStats>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let (farmers, executives, schemes, requests, applications) = tokio::join!(
    state.store.farmer_stats(),
    state.store.executive_count(),
    state.store.scheme_stats(),
    state.store.request_stats(),
    state.store.application_stats(),
  );
  Ok(Json(DashboardStats {
    farmers:         farmers?,
    executives:      executives?,
    schemes:         schemes?,
    requests:        requests?,
    applications:    applications?,
    not_derived:     DashboardStats::not_derived_block(),
    pending_sources: DashboardStats::pending_sources(),
  }))
}

/// `GET /api/admin/settings`
pub async fn get_settings<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Json<Settings>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.settings().await?))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSettingsBody {
  pub notification_templates: Option<Vec<NotificationTemplate>>,
  pub sms_enabled:            Option<bool>,
  pub maintenance_mode:       Option<bool>,
}

/// `PUT /api/admin/settings`
pub async fn update_settings<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
  JsonBody(body): JsonBody<UpdateSettingsBody>,
) -> Result<Json<Settings>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let settings = state
    .store
    .update_settings(SettingsUpdate {
      notification_templates: body.notification_templates,
      sms_enabled:            body.sms_enabled,
      maintenance_mode:       body.maintenance_mode,
    })
    .await?;
  Ok(Json(settings))
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// `GET /api/admin/reports/farmers` — the full farmer register as a PDF.
pub async fn farmers_report<S>(
  State(state): State<AppState<S>>,
  _admin: AdminUser,
) -> Result<Response, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let farmers = state.store.list_farmers().await?;
  let report = krishi_report::farmer_register(&farmers, Utc::now());
  Ok(crate::pdf_attachment(
    report,
    state.config.report_rows_per_page,
    "farmer-register.pdf",
  ))
}
