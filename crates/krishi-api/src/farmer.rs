//! Farmer portal routes, mounted under `/api/farmer`.
//!
//! - `GET|PUT /profile` — own profile
//! - `GET /field-status` — the condition recorded by the assigned executive
//! - `GET|POST /requests`, `GET|PUT /requests/{id}`,
//!   `POST /requests/{id}/comments` — own support requests
//! - `GET /schemes`, `PUT|DELETE /schemes/{id}/save` — browse active
//!   schemes and bookmark them
//! - `GET|POST /applications`, `GET /applications/{id}` — own scheme
//!   applications
//! - `GET|POST /photos` — geotagged field photos
//!
//! Record-scoped routes return 403 when the record belongs to another
//! farmer.

use axum::{
  Json, Router,
  extract::{Multipart, Path, State, multipart::Field},
  http::StatusCode,
  routing::{get, post, put},
};
use krishi_core::{
  application::{ApplicationDetail, NewApplication, SchemeApplication},
  farmer::{Farmer, FarmerUpdate, FieldPhoto, GeoPoint, Gender, NewFieldPhoto},
  field_status::FieldStatus,
  request::{
    NewRequest, Priority, Request, RequestComment, RequestDetail, RequestUpdate,
  },
  role::{Actor, Role},
  scheme::{GovernmentScheme, SchemeStatus},
  store::PortalStore,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  AppState,
  auth::FarmerUser,
  error::{ApiError, JsonBody, require},
};

pub fn routes<S>() -> Router<AppState<S>>
where
  S: PortalStore + Clone + 'static,
{
  Router::new()
    .route("/profile", get(profile).put(update_profile::<S>))
    .route("/field-status", get(field_status::<S>))
    .route("/requests", get(list_requests::<S>).post(create_request::<S>))
    .route(
      "/requests/{id}",
      get(get_request::<S>).put(update_request::<S>),
    )
    .route("/requests/{id}/comments", post(comment_request::<S>))
    .route("/schemes", get(list_schemes::<S>))
    .route(
      "/schemes/{id}/save",
      put(save_scheme::<S>).delete(unsave_scheme::<S>),
    )
    .route(
      "/applications",
      get(list_applications::<S>).post(create_application::<S>),
    )
    .route("/applications/{id}", get(get_application::<S>))
    .route("/photos", get(list_photos::<S>).post(upload_photo::<S>))
}

/// Load a request and check it belongs to the calling farmer.
async fn owned_request<S>(
  state: &AppState<S>,
  farmer_id: Uuid,
  request_id: Uuid,
) -> Result<RequestDetail, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let detail = state
    .store
    .get_request(request_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("request {request_id} not found")))?;
  if detail.request.farmer_id != farmer_id {
    return Err(ApiError::Forbidden);
  }
  Ok(detail)
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /api/farmer/profile`
pub async fn profile(FarmerUser(farmer): FarmerUser) -> Json<Farmer> {
  Json(farmer)
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileBody {
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

/// `PUT /api/farmer/profile`
pub async fn update_profile<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  JsonBody(body): JsonBody<UpdateProfileBody>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let updated = state
    .store
    .update_farmer(farmer.farmer_id, FarmerUpdate {
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
  Ok(Json(updated))
}

/// `GET /api/farmer/field-status`
pub async fn field_status<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
) -> Result<Json<FieldStatus>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let status = state
    .store
    .get_field_status(farmer.farmer_id)
    .await?
    .ok_or_else(|| ApiError::NotFound("no field status recorded yet".to_owned()))?;
  Ok(Json(status))
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// `GET /api/farmer/requests`
pub async fn list_requests<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
) -> Result<Json<Vec<Request>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(
    state.store.list_requests_for_farmer(farmer.farmer_id).await?,
  ))
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
  pub title:       String,
  pub description: String,
  pub category:    Option<String>,
  pub priority:    Option<Priority>,
}

/// `POST /api/farmer/requests` — opens a new request in `pending`.
pub async fn create_request<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  JsonBody(body): JsonBody<CreateRequestBody>,
) -> Result<(StatusCode, Json<Request>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("title", &body.title)?;
  require("description", &body.description)?;
  let request = state
    .store
    .create_request(NewRequest {
      farmer_id:   farmer.farmer_id,
      title:       body.title,
      description: body.description,
      category:    body.category,
      priority:    body.priority.unwrap_or_default(),
    })
    .await?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /api/farmer/requests/{id}`
pub async fn get_request<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  Path(id): Path<Uuid>,
) -> Result<Json<RequestDetail>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let detail = owned_request(&state, farmer.farmer_id, id).await?;
  Ok(Json(detail))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateRequestBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub priority:    Option<Priority>,
}

/// `PUT /api/farmer/requests/{id}` — only while the request is still
/// `pending`.
pub async fn update_request<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<UpdateRequestBody>,
) -> Result<Json<Request>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  owned_request(&state, farmer.farmer_id, id).await?;
  let request = state
    .store
    .update_request(id, RequestUpdate {
      title:       body.title,
      description: body.description,
      category:    body.category,
      priority:    body.priority,
    })
    .await?;
  Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `POST /api/farmer/requests/{id}/comments`
pub async fn comment_request<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  Path(id): Path<Uuid>,
  JsonBody(body): JsonBody<CommentBody>,
) -> Result<(StatusCode, Json<RequestComment>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  require("body", &body.body)?;
  owned_request(&state, farmer.farmer_id, id).await?;
  let comment = state
    .store
    .add_request_comment(id, Actor::new(Role::Farmer, farmer.farmer_id), body.body)
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Schemes ─────────────────────────────────────────────────────────────────

/// `GET /api/farmer/schemes` — active schemes only.
pub async fn list_schemes<S>(
  State(state): State<AppState<S>>,
  _farmer: FarmerUser,
) -> Result<Json<Vec<GovernmentScheme>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(
    state.store.list_schemes(Some(SchemeStatus::Active)).await?,
  ))
}

/// `PUT /api/farmer/schemes/{id}/save` — bookmark a scheme. Idempotent.
pub async fn save_scheme<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.save_scheme(farmer.farmer_id, id).await?))
}

/// `DELETE /api/farmer/schemes/{id}/save` — drop a bookmark. Idempotent.
pub async fn unsave_scheme<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Farmer>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(state.store.unsave_scheme(farmer.farmer_id, id).await?))
}

// ─── Applications ────────────────────────────────────────────────────────────

/// `GET /api/farmer/applications`
pub async fn list_applications<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
) -> Result<Json<Vec<SchemeApplication>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  Ok(Json(
    state
      .store
      .list_applications_for_farmer(farmer.farmer_id)
      .await?,
  ))
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationBody {
  pub scheme_id: Uuid,
  /// Names of the documents being submitted.
  #[serde(default)]
  pub documents: Vec<String>,
}

/// `POST /api/farmer/applications` — one live application per scheme; a
/// new one is allowed only after a rejection.
pub async fn create_application<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  JsonBody(body): JsonBody<CreateApplicationBody>,
) -> Result<(StatusCode, Json<ApplicationDetail>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let documents: Vec<String> = body
    .documents
    .into_iter()
    .map(|name| name.trim().to_owned())
    .filter(|name| !name.is_empty())
    .collect();
  let detail = state
    .store
    .create_application(NewApplication {
      farmer_id: farmer.farmer_id,
      scheme_id: body.scheme_id,
      documents,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /api/farmer/applications/{id}`
pub async fn get_application<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
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
  if detail.application.farmer_id != farmer.farmer_id {
    return Err(ApiError::Forbidden);
  }
  Ok(Json(detail))
}

// ─── Photos ──────────────────────────────────────────────────────────────────

/// A stored photo plus the URL it is served back under.
#[derive(Debug, Serialize)]
pub struct PhotoView {
  #[serde(flatten)]
  pub photo: FieldPhoto,
  pub url:   String,
}

/// `GET /api/farmer/photos`
pub async fn list_photos<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
) -> Result<Json<Vec<PhotoView>>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let photos = state.store.list_field_photos(farmer.farmer_id).await?;
  let views = photos
    .into_iter()
    .map(|photo| PhotoView {
      url: crate::upload_url(&state.config, &photo.path),
      photo,
    })
    .collect::<Vec<_>>();
  Ok(Json(views))
}

/// `POST /api/farmer/photos` — multipart upload with a `photo` file part
/// and optional `latitude`/`longitude` text parts. The file is stored
/// under a fresh UUID name in `photo_dir`; its SHA-256 digest is recorded.
pub async fn upload_photo<S>(
  State(state): State<AppState<S>>,
  FarmerUser(farmer): FarmerUser,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<PhotoView>), ApiError>
where
  S: PortalStore + Clone + 'static,
{
  let mut image: Option<(Vec<u8>, String, String)> = None;
  let mut latitude = None;
  let mut longitude = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|err| ApiError::BadRequest(format!("malformed multipart body: {err}")))?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("photo") => {
        let media_type = field
          .content_type()
          .unwrap_or("application/octet-stream")
          .to_owned();
        let extension = field
          .file_name()
          .and_then(|name| name.rsplit_once('.'))
          .map(|(_, ext)| ext.to_ascii_lowercase())
          .unwrap_or_else(|| extension_for(&media_type).to_owned());
        let bytes = field
          .bytes()
          .await
          .map_err(|err| ApiError::BadRequest(format!("unreadable photo part: {err}")))?;
        image = Some((bytes.to_vec(), media_type, extension));
      }
      Some("latitude") => latitude = Some(parse_coordinate(field, "latitude").await?),
      Some("longitude") => longitude = Some(parse_coordinate(field, "longitude").await?),
      _ => {}
    }
  }

  let (bytes, media_type, extension) = image.ok_or_else(|| ApiError::Validation {
    field:   "photo",
    message: "missing photo file part".to_owned(),
  })?;
  if bytes.is_empty() {
    return Err(ApiError::Validation {
      field:   "photo",
      message: "empty file".to_owned(),
    });
  }
  let location = match (latitude, longitude) {
    (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
    (None, None) => None,
    _ => {
      return Err(ApiError::Validation {
        field:   "location",
        message: "latitude and longitude must be supplied together".to_owned(),
      });
    }
  };

  let content_hash = hex::encode(Sha256::digest(&bytes));
  let file_name = format!("{}.{extension}", Uuid::new_v4());
  tokio::fs::create_dir_all(&state.config.photo_dir)
    .await
    .map_err(|err| ApiError::Internal(format!("creating photo dir: {err}")))?;
  let disk_path = state.config.photo_dir.join(&file_name);
  tokio::fs::write(&disk_path, &bytes)
    .await
    .map_err(|err| ApiError::Internal(format!("writing {disk_path:?}: {err}")))?;

  let photo = state
    .store
    .add_field_photo(NewFieldPhoto {
      farmer_id: farmer.farmer_id,
      path: file_name,
      content_hash,
      media_type,
      uploaded_by: Role::Farmer,
      location,
    })
    .await?;

  let url = crate::upload_url(&state.config, &photo.path);
  Ok((StatusCode::CREATED, Json(PhotoView { photo, url })))
}

async fn parse_coordinate(field: Field<'_>, name: &'static str) -> Result<f64, ApiError> {
  field
    .text()
    .await
    .map_err(|err| ApiError::BadRequest(format!("unreadable {name} part: {err}")))?
    .trim()
    .parse()
    .map_err(|_| ApiError::Validation {
      field:   name,
      message: "not a number".to_owned(),
    })
}

fn extension_for(media_type: &str) -> &'static str {
  match media_type {
    "image/jpeg" => "jpg",
    "image/png" => "png",
    "image/webp" => "webp",
    _ => "bin",
  }
}
