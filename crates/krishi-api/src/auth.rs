//! Bearer-token authentication shared by all three portals.
//!
//! One login route serves admins, executives, and farmers; the presented
//! role picks the identifier field. Verified tokens resolve back to a live
//! [`Principal`] on every request, so deleted accounts lose access
//! immediately regardless of token expiry.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json, Router,
  extract::{FromRequestParts, State},
  http::{header, request::Parts},
  routing::{get, post},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use krishi_core::{
  executive::Executive,
  farmer::Farmer,
  principal::{Admin, Principal},
  role::{Actor, Role},
  store::PortalStore,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, JsonBody},
};

// ─── Key material ────────────────────────────────────────────────────────────

/// Shorter secrets make HS256 brute-forceable; refuse to start with one.
const MIN_SECRET_BYTES: usize = 32;

/// Returned by [`JwtKeys::new`] when the configured secret is too short.
#[derive(Debug, Error)]
#[error("jwt_secret must be at least {MIN_SECRET_BYTES} bytes")]
pub struct SecretTooShort;

/// Payload carried in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  Uuid,
  pub role: Role,
  /// Unix seconds.
  pub iat:  u64,
  pub exp:  u64,
}

/// HS256 signing and verification keys plus the configured token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
  encoding:    EncodingKey,
  decoding:    DecodingKey,
  expiry_secs: u64,
}

impl JwtKeys {
  pub fn new(secret: &str, expiry_secs: u64) -> Result<Self, SecretTooShort> {
    if secret.len() < MIN_SECRET_BYTES {
      return Err(SecretTooShort);
    }
    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      expiry_secs,
    })
  }

  /// Sign a token for the principal; returns the token and when it expires.
  pub fn sign(
    &self,
    role: Role,
    id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(String, DateTime<Utc>), ApiError> {
    let issued = now.timestamp().max(0) as u64;
    let claims = Claims {
      sub: id,
      role,
      iat: issued,
      exp: issued + self.expiry_secs,
    };
    let token = encode(&Header::default(), &claims, &self.encoding)
      .map_err(|err| ApiError::Internal(format!("token signing: {err}")))?;
    let expires_at = now + chrono::Duration::seconds(self.expiry_secs as i64);
    Ok((token, expires_at))
  }

  /// Decode and validate a presented token. Every defect (bad signature,
  /// wrong shape, expired) collapses into the same 401.
  pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(token, &self.decoding, &Validation::default())
      .map(|data| data.claims)
      .map_err(|_| ApiError::Unauthorized("invalid or expired token"))
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Minimum accepted length for newly created account passwords.
const MIN_PASSWORD_CHARS: usize = 8;

/// Validate a password chosen for a new account.
pub(crate) fn check_new_password(password: &str) -> Result<(), ApiError> {
  if password.chars().count() < MIN_PASSWORD_CHARS {
    return Err(ApiError::Validation {
      field:   "password",
      message: format!("must be at least {MIN_PASSWORD_CHARS} characters"),
    });
  }
  Ok(())
}

/// Hash a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|err| ApiError::Internal(format!("argon2: {err}")))
}

/// Check a password against a stored PHC string. Unparseable hashes count
/// as a mismatch rather than an error.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The live principal behind a valid bearer token.
pub struct AuthUser {
  pub principal: Principal,
}

impl AuthUser {
  /// The identity to record in audit trails.
  pub fn actor(&self) -> Actor {
    Actor::new(self.principal.role(), self.principal.id())
  }
}

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: PortalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let value = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .ok_or(ApiError::Unauthorized("missing authorization header"))?;
    let token = value
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthorized("missing bearer token"))?;
    let claims = state.auth.verify(token)?;
    let principal = state
      .store
      .get_principal(claims.role, claims.sub)
      .await?
      .ok_or(ApiError::Unauthorized("account no longer exists"))?;
    Ok(AuthUser { principal })
  }
}

/// Admin gate: any other role is rejected with 403.
pub struct AdminUser(pub Admin);

impl<S> FromRequestParts<AppState<S>> for AdminUser
where
  S: PortalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match AuthUser::from_request_parts(parts, state).await?.principal {
      Principal::Admin(admin) => Ok(Self(admin)),
      _ => Err(ApiError::Forbidden),
    }
  }
}

/// Executive gate: any other role is rejected with 403.
pub struct ExecutiveUser(pub Executive);

impl<S> FromRequestParts<AppState<S>> for ExecutiveUser
where
  S: PortalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match AuthUser::from_request_parts(parts, state).await?.principal {
      Principal::Executive(executive) => Ok(Self(executive)),
      _ => Err(ApiError::Forbidden),
    }
  }
}

/// Farmer gate: any other role is rejected with 403.
pub struct FarmerUser(pub Farmer);

impl<S> FromRequestParts<AppState<S>> for FarmerUser
where
  S: PortalStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match AuthUser::from_request_parts(parts, state).await?.principal {
      Principal::Farmer(farmer) => Ok(Self(farmer)),
      _ => Err(ApiError::Forbidden),
    }
  }
}

// ─── Routes ──────────────────────────────────────────────────────────────────

pub fn routes<S>() -> Router<AppState<S>>
where
  S: PortalStore + Clone + 'static,
{
  Router::new()
    .route("/login", post(login::<S>))
    .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub role:       Role,
  /// Username, email, or mobile number depending on the role.
  pub identifier: String,
  pub password:   String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub role:       Role,
  pub profile:    Principal,
}

/// `POST /api/auth/login` — verify credentials and issue a token.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: PortalStore + Clone + 'static,
{
  // Farmers log in with their mobile number in whatever shape they type it.
  let identifier = match body.role {
    Role::Farmer => {
      krishi_sms::normalize_number(&body.identifier, &state.config.sms.country_code)
        .unwrap_or(body.identifier)
    }
    _ => body.identifier,
  };

  let principal = match state.store.find_principal(body.role, identifier).await? {
    Some(principal) => principal,
    None => {
      // Burn the same argon2 work as a real check so response timing does
      // not reveal whether the account exists.
      let _ = hash_password(&body.password);
      return Err(ApiError::Unauthorized("invalid credentials"));
    }
  };

  if !verify_password(&body.password, principal.password_hash()) {
    return Err(ApiError::Unauthorized("invalid credentials"));
  }

  let (token, expires_at) = state.auth.sign(body.role, principal.id(), Utc::now())?;
  tracing::info!(role = %body.role, id = %principal.id(), "login");

  Ok(Json(LoginResponse {
    token,
    expires_at,
    role: body.role,
    profile: principal,
  }))
}

/// `GET /api/auth/me` — the profile behind the presented token.
pub async fn me(user: AuthUser) -> Json<Principal> {
  Json(user.principal)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  const SECRET: &str = "an-hs256-secret-that-is-long-enough!";

  #[test]
  fn short_secrets_are_refused() {
    assert!(JwtKeys::new("tooshort", 3600).is_err());
  }

  #[test]
  fn tokens_round_trip() {
    let keys = JwtKeys::new(SECRET, 3600).unwrap();
    let id = Uuid::new_v4();
    let (token, _expires) = keys.sign(Role::Executive, id, Utc::now()).unwrap();
    let claims = keys.verify(&token).unwrap();
    assert_eq!(claims.sub, id);
    assert_eq!(claims.role, Role::Executive);
    assert_eq!(claims.exp, claims.iat + 3600);
  }

  #[test]
  fn expired_tokens_are_rejected() {
    let keys = JwtKeys::new(SECRET, 3600).unwrap();
    // Validation allows 60s of clock leeway, so back-date well past it.
    let issued = Utc::now() - Duration::hours(2);
    let (token, _) = keys.sign(Role::Admin, Uuid::new_v4(), issued).unwrap();
    assert!(keys.verify(&token).is_err());
  }

  #[test]
  fn foreign_signatures_are_rejected() {
    let keys = JwtKeys::new(SECRET, 3600).unwrap();
    let other = JwtKeys::new("a-completely-different-signing-secret", 3600).unwrap();
    let (token, _) = keys.sign(Role::Farmer, Uuid::new_v4(), Utc::now()).unwrap();
    assert!(other.verify(&token).is_err());
  }

  #[test]
  fn password_hashes_verify() {
    let hash = hash_password("correct horse").unwrap();
    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("wrong horse", &hash));
    assert!(!verify_password("correct horse", "not-a-phc-string"));
  }
}
