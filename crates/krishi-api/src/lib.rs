//! HTTP/JSON API for the Krishi portal.
//!
//! Builds an axum [`Router`] over any [`PortalStore`], with bearer-token
//! authentication, one role-gated route group per portal, and the report,
//! SMS, and photo-upload surfaces. The `server` binary wires it to the
//! SQLite store.

pub mod admin;
pub mod auth;
pub mod error;
pub mod executive;
pub mod farmer;
pub mod schemes;

#[cfg(test)]
mod tests;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::{DefaultBodyLimit, Path, State},
  http::header,
  response::{IntoResponse, Response},
  routing::get,
};
use krishi_core::store::PortalStore;
use krishi_report::TableReport;
use krishi_sms::{Dispatcher, SmsConfig};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

pub use crate::error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, read from `config.toml` with `KRISHI_*`
/// environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  /// External base URL used when composing photo links.
  pub base_url:             String,
  pub store_path:           PathBuf,
  /// Directory uploaded field photos are written to.
  pub photo_dir:            PathBuf,
  /// HS256 signing secret; the server refuses to start on fewer than
  /// 32 bytes.
  pub jwt_secret:           String,
  pub token_expiry_secs:    u64,
  pub admin_username:       String,
  pub admin_name:           String,
  /// Argon2 PHC string for the bootstrap admin; generate one with
  /// `--hash-password`. No admin is bootstrapped while unset.
  pub admin_password_hash:  Option<String>,
  pub report_rows_per_page: usize,
  pub sms:                  SmsConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_owned(),
      port:                 8080,
      base_url:             "http://localhost:8080".to_owned(),
      store_path:           PathBuf::from("krishi.db"),
      photo_dir:            PathBuf::from("uploads"),
      jwt_secret:           String::new(),
      token_expiry_secs:    24 * 60 * 60,
      admin_username:       "admin".to_owned(),
      admin_name:           "Portal Admin".to_owned(),
      admin_password_hash:  None,
      report_rows_per_page: krishi_report::DEFAULT_ROWS_PER_PAGE,
      sms:                  SmsConfig::default(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through every handler.
#[derive(Clone)]
pub struct AppState<S: PortalStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<auth::JwtKeys>,
  pub sms:    Arc<Dispatcher>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Request bodies above this size are rejected outright.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Build the complete portal router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PortalStore + Clone + 'static,
{
  Router::new()
    .nest("/api/auth", auth::routes::<S>())
    .nest("/api/admin", admin::routes::<S>())
    .nest("/api/executive", executive::routes::<S>())
    .nest("/api/farmer", farmer::routes::<S>())
    .nest("/api/scheme-management", schemes::routes::<S>())
    .route("/healthz", get(healthz))
    .route("/uploads/{file}", get(serve_upload::<S>))
    .layer(DefaultBodyLimit::max(BODY_LIMIT))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn healthz() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

/// `GET /uploads/{file}` — serve an uploaded photo out of `photo_dir`.
async fn serve_upload<S>(
  State(state): State<AppState<S>>,
  Path(file): Path<String>,
) -> Result<Response, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  // Uploads live in one flat directory; anything that could climb out of
  // it is treated as unknown.
  if file.contains('/') || file.contains('\\') || file.contains("..") {
    return Err(ApiError::NotFound(format!("upload {file:?} not found")));
  }
  let path = state.config.photo_dir.join(&file);
  let bytes = tokio::fs::read(&path)
    .await
    .map_err(|_| ApiError::NotFound(format!("upload {file:?} not found")))?;
  let content_type = match path.extension().and_then(|ext| ext.to_str()) {
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("png") => "image/png",
    Some("webp") => "image/webp",
    _ => "application/octet-stream",
  };
  Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

// ─── Shared handler helpers ──────────────────────────────────────────────────

/// Render a table report as a `Content-Disposition: attachment` PDF.
pub(crate) fn pdf_attachment(
  mut report: TableReport,
  rows_per_page: usize,
  filename: &str,
) -> Response {
  report.rows_per_page = rows_per_page.max(1);
  let bytes = report.render();
  (
    [
      (header::CONTENT_TYPE, "application/pdf".to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    bytes,
  )
    .into_response()
}

/// The public URL an uploaded photo is served back under.
pub(crate) fn upload_url(config: &ServerConfig, path: &str) -> String {
  format!("{}/uploads/{}", config.base_url.trim_end_matches('/'), path)
}
