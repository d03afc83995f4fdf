//! Integration tests: the full router over an in-memory store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use krishi_core::{principal::NewAdmin, store::PortalStore as _};
use krishi_sms::{Dispatcher, SmsConfig};
use krishi_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  AppState, ServerConfig,
  auth::{JwtKeys, hash_password},
  router,
};

const TEST_SECRET: &str = "krishi-test-secret-0123456789abcdef";

async fn state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let photo_dir =
    std::env::temp_dir().join(format!("krishi-api-test-{}", Uuid::new_v4()));
  let config = ServerConfig {
    photo_dir,
    jwt_secret: TEST_SECRET.to_owned(),
    ..ServerConfig::default()
  };
  let sms = Dispatcher::new(SmsConfig {
    send_delay_ms: 0,
    ..SmsConfig::default()
  })
  .expect("sms client");
  AppState {
    store:  Arc::new(store),
    config: Arc::new(config),
    auth:   Arc::new(JwtKeys::new(TEST_SECRET, 3600).expect("jwt keys")),
    sms:    Arc::new(sms),
  }
}

async fn send_raw(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let request = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  router(state.clone()).oneshot(request).await.unwrap()
}

async fn send(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let response = send_raw(state, method, uri, token, body).await;
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn login(
  state: &AppState<SqliteStore>,
  role: &str,
  identifier: &str,
  password: &str,
) -> String {
  let (status, body) = send(
    state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({ "role": role, "identifier": identifier, "password": password })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "login failed: {body}");
  body["token"].as_str().unwrap().to_owned()
}

/// Insert the bootstrap admin directly and log in as them.
async fn seed_admin(state: &AppState<SqliteStore>) -> String {
  state
    .store
    .ensure_admin(NewAdmin {
      username:      "admin".to_owned(),
      name:          "Portal Admin".to_owned(),
      password_hash: hash_password("admin-secret").unwrap(),
    })
    .await
    .unwrap();
  login(state, "admin", "admin", "admin-secret").await
}

async fn create_executive(
  state: &AppState<SqliteStore>,
  admin: &str,
  email: &str,
) -> (Uuid, String) {
  let (status, body) = send(
    state,
    "POST",
    "/api/admin/executives",
    Some(admin),
    Some(json!({
      "name": "Ravi Kumar",
      "email": email,
      "password": "field-pass-1",
      "region": "Nashik",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "create executive: {body}");
  let id = body["executive_id"].as_str().unwrap().parse().unwrap();
  let token = login(state, "executive", email, "field-pass-1").await;
  (id, token)
}

async fn create_farmer(
  state: &AppState<SqliteStore>,
  executive: &str,
  mobile: &str,
) -> (Uuid, String) {
  let (status, body) = send(
    state,
    "POST",
    "/api/executive/farmers",
    Some(executive),
    Some(json!({
      "name": "Asha Devi",
      "mobile": mobile,
      "password": "farm-pass-1",
      "village": "Rampur",
      "income": 120000,
      "credit_score": 640,
      "crops": ["paddy"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "create farmer: {body}");
  let id = body["farmer_id"].as_str().unwrap().parse().unwrap();
  let token = login(state, "farmer", mobile, "farm-pass-1").await;
  (id, token)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
  haystack.windows(needle.len()).any(|window| window == needle)
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn healthz_needs_no_token() {
  let state = state().await;
  let (status, body) = send(&state, "GET", "/healthz", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn login_issues_a_token_that_resolves_via_me() {
  let state = state().await;
  seed_admin(&state).await;

  let (status, body) = send(
    &state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({
      "role": "admin", "identifier": "admin", "password": "admin-secret",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["token"].is_string());
  assert!(body["expires_at"].is_string());
  assert_eq!(body["role"], "admin");
  assert_eq!(body["profile"]["role"], "admin");
  assert_eq!(body["profile"]["username"], "admin");
  assert!(body["profile"].get("password_hash").is_none());

  let token = body["token"].as_str().unwrap();
  let (status, me) = send(&state, "GET", "/api/auth/me", Some(token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["role"], "admin");
  assert_eq!(me["name"], "Portal Admin");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
  let state = state().await;
  seed_admin(&state).await;

  let wrong_password = send(
    &state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({ "role": "admin", "identifier": "admin", "password": "nope" })),
  )
  .await;
  let unknown_account = send(
    &state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({ "role": "admin", "identifier": "ghost", "password": "nope" })),
  )
  .await;

  assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
  assert_eq!(unknown_account.0, StatusCode::UNAUTHORIZED);
  assert_eq!(wrong_password.1, unknown_account.1);
}

#[tokio::test]
async fn farmers_log_in_with_any_readable_mobile_shape() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  create_farmer(&state, &exec, "98123 45678").await;

  let token = login(&state, "farmer", "+91 98123 45678", "farm-pass-1").await;
  let (_, me) = send(&state, "GET", "/api/auth/me", Some(&token), None).await;
  assert_eq!(me["mobile"], "+919812345678");
}

#[tokio::test]
async fn malformed_inputs_are_400s_with_an_error_body() {
  let state = state().await;
  let admin = seed_admin(&state).await;

  // unknown role enum in a JSON body
  let (status, body) = send(
    &state,
    "POST",
    "/api/auth/login",
    None,
    Some(json!({ "role": "superuser", "identifier": "x", "password": "y" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  // unknown status in a query filter
  let (status, body) = send(
    &state,
    "GET",
    "/api/admin/requests?status=sideways",
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn role_gates_reject_other_roles_and_missing_tokens() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;

  let (status, body) =
    send(&state, "GET", "/api/admin/farmers", Some(&exec), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "forbidden");

  let (status, _) = send(&state, "GET", "/api/admin/farmers", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) =
    send(&state, "GET", "/api/admin/farmers", Some("junk.token.here"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) =
    send(&state, "GET", "/api/farmer/profile", Some(&admin), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_accounts_lose_access_immediately() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (exec_id, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;

  let (status, _) = send(
    &state,
    "DELETE",
    &format!("/api/admin/executives/{exec_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&state, "GET", "/api/auth/me", Some(&exec), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn executive_creation_validates_its_input() {
  let state = state().await;
  let admin = seed_admin(&state).await;

  let (status, body) = send(
    &state,
    "POST",
    "/api/admin/executives",
    Some(&admin),
    Some(json!({ "name": "Ravi", "email": "not-an-email", "password": "field-pass-1" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "email");

  let (status, body) = send(
    &state,
    "POST",
    "/api/admin/executives",
    Some(&admin),
    Some(json!({ "name": "Ravi", "email": "ravi@krishi.example", "password": "short" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "password");

  create_executive(&state, &admin, "ravi@krishi.example").await;
  let (status, body) = send(
    &state,
    "POST",
    "/api/admin/executives",
    Some(&admin),
    Some(json!({
      "name": "Another Ravi",
      "email": "ravi@krishi.example",
      "password": "field-pass-2",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn profile_updates_apply_only_the_given_fields() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let (status, profile) = send(
    &state,
    "PUT",
    "/api/farmer/profile",
    Some(&farmer),
    Some(json!({ "village": "Pimpalgaon" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["village"], "Pimpalgaon");
  assert_eq!(profile["name"], "Asha Devi");
  assert_eq!(profile["mobile"], "+919812345678");
  assert_eq!(profile["crops"], json!(["paddy"]));

  let (status, profile) = send(
    &state,
    "PUT",
    "/api/executive/profile",
    Some(&exec),
    Some(json!({ "region": "Pune" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["region"], "Pune");
  assert_eq!(profile["email"], "ravi@krishi.example");
}

#[tokio::test]
async fn executive_scope_is_enforced_on_farmer_records() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec1) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, exec2) = create_executive(&state, &admin, "meena@krishi.example").await;
  let (farmer_id, _) = create_farmer(&state, &exec1, "9812345678").await;

  let (status, _) = send(
    &state,
    "GET",
    &format!("/api/executive/farmers/{farmer_id}"),
    Some(&exec2),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/executive/farmers/{farmer_id}/field-status"),
    Some(&exec2),
    Some(json!({ "health": "red" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(
    &state,
    "GET",
    &format!("/api/executive/farmers/{farmer_id}"),
    Some(&exec1),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn executive_delete_guard_releases_cleanly() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (exec_id, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (farmer_id, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let (_, request) = send(
    &state,
    "POST",
    "/api/farmer/requests",
    Some(&farmer),
    Some(json!({ "title": "Pump repair", "description": "Motor stopped." })),
  )
  .await;
  let request_id = request["request_id"].as_str().unwrap().to_owned();
  send(
    &state,
    "POST",
    &format!("/api/executive/requests/{request_id}/claim"),
    Some(&exec),
    None,
  )
  .await;

  // refused while a farmer is assigned
  let (status, body) = send(
    &state,
    "DELETE",
    &format!("/api/admin/executives/{exec_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("assigned farmer"));

  // unassign, then delete succeeds
  let (status, released) = send(
    &state,
    "DELETE",
    &format!("/api/admin/executives/{exec_id}/farmers/{farmer_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(released["assigned_executive"].is_null());

  let (status, _) = send(
    &state,
    "DELETE",
    &format!("/api/admin/executives/{exec_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  // the claimed request is released but keeps its state
  let (_, detail) = send(
    &state,
    "GET",
    &format!("/api/admin/requests/{request_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert!(detail["request"]["assigned_executive"].is_null());
  assert_eq!(detail["request"]["status"], "in-progress");
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_lifecycle_end_to_end() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (exec_id, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let (status, created) = send(
    &state,
    "POST",
    "/api/farmer/requests",
    Some(&farmer),
    Some(json!({
      "title": "Drip line burst",
      "description": "Main line near the well is leaking.",
      "category": "irrigation",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["status"], "pending");
  assert_eq!(created["priority"], "medium");
  assert!(created["assigned_executive"].is_null());
  let id = created["request_id"].as_str().unwrap().to_owned();

  // visible in the executive queue while unassigned and pending
  let (_, queue) = send(&state, "GET", "/api/executive/requests", Some(&exec), None).await;
  assert!(
    queue
      .as_array()
      .unwrap()
      .iter()
      .any(|r| r["request_id"] == created["request_id"])
  );

  // but untouchable until claimed
  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/executive/requests/{id}/status"),
    Some(&exec),
    Some(json!({ "status": "in-progress" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, claimed) = send(
    &state,
    "POST",
    &format!("/api/executive/requests/{id}/claim"),
    Some(&exec),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(claimed["status"], "in-progress");
  assert_eq!(claimed["assigned_executive"].as_str().unwrap(), exec_id.to_string());

  // a second claim fails
  let (status, _) = send(
    &state,
    "POST",
    &format!("/api/executive/requests/{id}/claim"),
    Some(&exec),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  // the farmer can no longer edit it
  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/farmer/requests/{id}"),
    Some(&farmer),
    Some(json!({ "title": "edited" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  // comments from both sides of the trail
  let (status, _) = send(
    &state,
    "POST",
    &format!("/api/farmer/requests/{id}/comments"),
    Some(&farmer),
    Some(json!({ "body": "Any update?" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = send(
    &state,
    "POST",
    &format!("/api/executive/requests/{id}/comments"),
    Some(&exec),
    Some(json!({ "body": "Visiting tomorrow morning." })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, resolved) = send(
    &state,
    "PUT",
    &format!("/api/executive/requests/{id}/status"),
    Some(&exec),
    Some(json!({ "status": "resolved" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(resolved["resolved_at"].is_string());

  // terminal states permit nothing further
  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/executive/requests/{id}/status"),
    Some(&exec),
    Some(json!({ "status": "pending" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  // the admin view carries the whole trail in posting order
  let (_, detail) = send(
    &state,
    "GET",
    &format!("/api/admin/requests/{id}"),
    Some(&admin),
    None,
  )
  .await;
  let comments = detail["comments"].as_array().unwrap();
  assert_eq!(comments.len(), 2);
  assert_eq!(comments[0]["author_role"], "farmer");
  assert_eq!(comments[1]["author_role"], "executive");
}

#[tokio::test]
async fn farmers_cannot_reach_each_others_requests() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer1) = create_farmer(&state, &exec, "9812345678").await;
  let (_, farmer2) = create_farmer(&state, &exec, "9898989898").await;

  let (_, request) = send(
    &state,
    "POST",
    "/api/farmer/requests",
    Some(&farmer1),
    Some(json!({ "title": "Seed quality", "description": "Last batch failed to germinate." })),
  )
  .await;
  let id = request["request_id"].as_str().unwrap();

  let (status, _) = send(
    &state,
    "GET",
    &format!("/api/farmer/requests/{id}"),
    Some(&farmer2),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(
    &state,
    "POST",
    &format!("/api/farmer/requests/{id}/comments"),
    Some(&farmer2),
    Some(json!({ "body": "mine too" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, listed) = send(&state, "GET", "/api/farmer/requests", Some(&farmer2), None).await;
  assert!(listed.as_array().unwrap().is_empty());
}

// ─── Schemes and applications ────────────────────────────────────────────────

#[tokio::test]
async fn scheme_text_blocks_round_trip_as_arrays() {
  let state = state().await;
  let admin = seed_admin(&state).await;

  let (status, scheme) = send(
    &state,
    "POST",
    "/api/scheme-management/schemes",
    Some(&admin),
    Some(json!({
      "title": "Soil Health Card",
      "description": "Free soil testing every season.",
      "eligibility": "All registered farmers\n\n  Active landholding  ",
      "benefits": ["Free lab test", "Fertiliser plan"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{scheme}");
  assert_eq!(
    scheme["eligibility"],
    json!(["All registered farmers", "Active landholding"])
  );
  assert_eq!(scheme["benefits"], json!(["Free lab test", "Fertiliser plan"]));
  assert_eq!(scheme["status"], "active");
  assert_eq!(scheme["relevance"], "medium");

  let id = scheme["scheme_id"].as_str().unwrap();
  let (status, updated) = send(
    &state,
    "PUT",
    &format!("/api/scheme-management/schemes/{id}"),
    Some(&admin),
    Some(json!({
      "benefits": "Free lab test\nFertiliser plan\nCrop advisory",
      "status": "upcoming",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    updated["benefits"],
    json!(["Free lab test", "Fertiliser plan", "Crop advisory"])
  );
  assert_eq!(updated["status"], "upcoming");
  assert_eq!(updated["title"], "Soil Health Card");
}

#[tokio::test]
async fn farmers_browse_active_schemes_and_bookmark_them() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let (_, active) = send(
    &state,
    "POST",
    "/api/scheme-management/schemes",
    Some(&admin),
    Some(json!({ "title": "Crop Insurance", "description": "Premium support." })),
  )
  .await;
  send(
    &state,
    "POST",
    "/api/scheme-management/schemes",
    Some(&admin),
    Some(json!({
      "title": "Retired Subsidy",
      "description": "No longer offered.",
      "status": "inactive",
    })),
  )
  .await;

  let (_, visible) = send(&state, "GET", "/api/farmer/schemes", Some(&farmer), None).await;
  let list = visible.as_array().unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0]["title"], "Crop Insurance");

  let active_id = active["scheme_id"].as_str().unwrap();
  let (status, saved) = send(
    &state,
    "PUT",
    &format!("/api/farmer/schemes/{active_id}/save"),
    Some(&farmer),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(saved["saved_schemes"], json!([active_id]));

  // bookmarking twice keeps one entry
  let (_, again) = send(
    &state,
    "PUT",
    &format!("/api/farmer/schemes/{active_id}/save"),
    Some(&farmer),
    None,
  )
  .await;
  assert_eq!(again["saved_schemes"].as_array().unwrap().len(), 1);

  let (_, cleared) = send(
    &state,
    "DELETE",
    &format!("/api/farmer/schemes/{active_id}/save"),
    Some(&farmer),
    None,
  )
  .await;
  assert!(cleared["saved_schemes"].as_array().unwrap().is_empty());

  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/farmer/schemes/{}/save", Uuid::new_v4()),
    Some(&farmer),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn application_review_flow_with_documents() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let (_, scheme) = send(
    &state,
    "POST",
    "/api/scheme-management/schemes",
    Some(&admin),
    Some(json!({
      "title": "Drip Irrigation Subsidy",
      "description": "Subsidised micro-irrigation for smallholders.",
      "required_documents": "Aadhaar card\nLand record",
    })),
  )
  .await;
  let scheme_id = scheme["scheme_id"].as_str().unwrap();

  let (status, app) = send(
    &state,
    "POST",
    "/api/farmer/applications",
    Some(&farmer),
    Some(json!({
      "scheme_id": scheme_id,
      "documents": ["Aadhaar card", "Land record"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{app}");
  let reference = app["application"]["reference"].as_str().unwrap();
  assert!(reference.starts_with("APP-"), "{reference}");
  assert!(reference.ends_with("-0001"), "{reference}");
  assert_eq!(reference.len(), "APP-20250101-0001".len());
  assert_eq!(app["application"]["status"], "pending");
  assert_eq!(app["history"].as_array().unwrap().len(), 1);
  assert_eq!(app["documents"].as_array().unwrap().len(), 2);
  let app_id = app["application"]["application_id"].as_str().unwrap().to_owned();

  // one live application per scheme
  let (status, dup) = send(
    &state,
    "POST",
    "/api/farmer/applications",
    Some(&farmer),
    Some(json!({ "scheme_id": scheme_id })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(dup["field"], "application");

  // pending cannot jump straight to approved
  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/scheme-management/applications/{app_id}/status"),
    Some(&admin),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, reviewed) = send(
    &state,
    "PUT",
    &format!("/api/scheme-management/applications/{app_id}/status"),
    Some(&admin),
    Some(json!({ "status": "under-review" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reviewed["application"]["status"], "under-review");
  assert!(reviewed["application"]["reviewed_by"].is_null());
  assert_eq!(reviewed["history"].as_array().unwrap().len(), 2);

  // document verification appends history without changing status
  let doc_id = reviewed["documents"][0]["document_id"].as_str().unwrap();
  let (status, verified) = send(
    &state,
    "PUT",
    &format!("/api/scheme-management/applications/{app_id}/documents"),
    Some(&admin),
    Some(json!({ "documents": [{ "document_id": doc_id, "verified": true }] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(verified["documents"][0]["verified"].as_bool().unwrap());
  assert_eq!(verified["application"]["status"], "under-review");
  assert_eq!(verified["history"].as_array().unwrap().len(), 3);

  // approval stamps the review fields and records the remarks
  let (status, approved) = send(
    &state,
    "PUT",
    &format!("/api/scheme-management/applications/{app_id}/status"),
    Some(&admin),
    Some(json!({ "status": "approved", "remarks": "All documents in order." })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(approved["application"]["status"], "approved");
  assert!(approved["application"]["reviewed_by"].is_string());
  assert!(approved["application"]["review_date"].is_string());
  let history = approved["history"].as_array().unwrap();
  assert_eq!(history.len(), 4);
  assert_eq!(history[3]["remarks"], "All documents in order.");

  // the applicant sees it; another farmer does not
  let (status, _) = send(
    &state,
    "GET",
    &format!("/api/farmer/applications/{app_id}"),
    Some(&farmer),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, other) = create_farmer(&state, &exec, "9898989898").await;
  let (status, _) = send(
    &state,
    "GET",
    &format!("/api/farmer/applications/{app_id}"),
    Some(&other),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Field status ────────────────────────────────────────────────────────────

#[tokio::test]
async fn field_status_upserts_and_reaches_the_farmer() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (farmer_id, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let (status, _) = send(&state, "GET", "/api/farmer/field-status", Some(&farmer), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, recorded) = send(
    &state,
    "PUT",
    &format!("/api/executive/farmers/{farmer_id}/field-status"),
    Some(&exec),
    Some(json!({ "health": "green" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(recorded["health"], "green");
  assert!(recorded["notes"].is_null());

  let (status, seen) = send(&state, "GET", "/api/farmer/field-status", Some(&farmer), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(seen["health"], "green");

  // a second write overwrites in place
  let (_, updated) = send(
    &state,
    "PUT",
    &format!("/api/executive/farmers/{farmer_id}/field-status"),
    Some(&exec),
    Some(json!({ "health": "yellow", "notes": "Aphids on the east plot." })),
  )
  .await;
  assert_eq!(updated["health"], "yellow");

  let (_, seen) = send(&state, "GET", "/api/farmer/field-status", Some(&farmer), None).await;
  assert_eq!(seen["health"], "yellow");
  assert_eq!(seen["notes"], "Aphids on the east plot.");
}

// ─── SMS ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sms_batches_normalise_numbers_and_log_the_outcome() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;

  let (status, report) = send(
    &state,
    "POST",
    "/api/executive/sms",
    Some(&exec),
    Some(json!({
      "message": "Mandi prices are up this week.",
      "numbers": ["98123 45678", "09876543210", "bogus"],
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["simulated"], true);
  assert_eq!(report["sent"], 2);
  assert_eq!(report["failed"], 1);
  let results = report["results"].as_array().unwrap();
  assert_eq!(results[0]["number"], "+919812345678");
  assert_eq!(results[0]["status"], "sent");
  assert_eq!(results[1]["number"], "+919876543210");
  assert_eq!(results[2]["status"], "failed");

  let (_, log) = send(&state, "GET", "/api/executive/sms/log", Some(&exec), None).await;
  let entries = log.as_array().unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0]["sent"], 2);
  assert_eq!(entries[0]["failed"], 1);
  assert_eq!(entries[0]["simulated"], true);
  assert_eq!(entries[0]["recipients"].as_array().unwrap().len(), 3);

  // a batch needs recipients and a message
  let (status, body) = send(
    &state,
    "POST",
    "/api/executive/sms",
    Some(&exec),
    Some(json!({ "message": "hello", "numbers": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "numbers");

  let (status, body) = send(
    &state,
    "POST",
    "/api/executive/sms",
    Some(&exec),
    Some(json!({ "message": "   ", "numbers": ["9812345678"] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "message");
}

#[tokio::test]
async fn sms_to_assigned_farmers_uses_their_stored_numbers() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  create_farmer(&state, &exec, "98123 45678").await;

  let (status, report) = send(
    &state,
    "POST",
    "/api/executive/sms",
    Some(&exec),
    Some(json!({ "message": "Visit tomorrow.", "to_assigned_farmers": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["sent"], 1);
  assert_eq!(report["results"][0]["number"], "+919812345678");
}

#[tokio::test]
async fn settings_round_trip_and_keep_dispatch_simulated_when_disabled() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;

  let (status, defaults) = send(&state, "GET", "/api/admin/settings", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(defaults["sms_enabled"], true);
  assert_eq!(defaults["maintenance_mode"], false);
  assert_eq!(defaults["notification_templates"].as_array().unwrap().len(), 2);

  let (status, updated) = send(
    &state,
    "PUT",
    "/api/admin/settings",
    Some(&admin),
    Some(json!({ "sms_enabled": false })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["sms_enabled"], false);
  assert_eq!(updated["maintenance_mode"], false);

  let (_, persisted) = send(&state, "GET", "/api/admin/settings", Some(&admin), None).await;
  assert_eq!(persisted["sms_enabled"], false);

  let (status, report) = send(
    &state,
    "POST",
    "/api/executive/sms",
    Some(&exec),
    Some(json!({ "message": "test", "numbers": ["9812345678"] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["simulated"], true);
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_serves_derived_figures_and_explicit_nulls() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;
  create_farmer(&state, &exec, "9898989898").await;

  let (_, scheme) = send(
    &state,
    "POST",
    "/api/scheme-management/schemes",
    Some(&admin),
    Some(json!({ "title": "Crop Insurance", "description": "Premium support." })),
  )
  .await;
  send(
    &state,
    "POST",
    "/api/farmer/requests",
    Some(&farmer),
    Some(json!({ "title": "Pump repair", "description": "Motor stopped." })),
  )
  .await;
  send(
    &state,
    "POST",
    "/api/farmer/applications",
    Some(&farmer),
    Some(json!({ "scheme_id": scheme["scheme_id"] })),
  )
  .await;

  let (status, dash) = send(&state, "GET", "/api/admin/dashboard", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(dash["farmers"]["total"], 2);
  assert_eq!(dash["farmers"]["assigned"], 2);
  assert_eq!(dash["farmers"]["unassigned"], 0);
  assert_eq!(dash["farmers"]["total_income"], 240000);
  assert_eq!(dash["executives"], 1);
  assert_eq!(dash["schemes"]["total"], 1);
  assert_eq!(dash["requests"]["total"], 1);
  assert_eq!(dash["applications"]["total"], 1);

  let not_derived = dash["not_derived"].as_object().unwrap();
  assert_eq!(not_derived.len(), 3);
  assert!(not_derived.values().all(Value::is_null));
  assert_eq!(
    dash["pending_sources"],
    json!(["carbon_credits_earned", "partner_companies", "month_over_month_trends"])
  );
}

// ─── Photos and uploads ──────────────────────────────────────────────────────

fn push_part(
  body: &mut Vec<u8>,
  boundary: &str,
  name: &str,
  file: Option<(&str, &str)>,
  payload: &[u8],
) {
  body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
  match file {
    Some((filename, content_type)) => body.extend_from_slice(
      format!(
        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
      )
      .as_bytes(),
    ),
    None => body.extend_from_slice(
      format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
    ),
  }
  body.extend_from_slice(payload);
  body.extend_from_slice(b"\r\n");
}

async fn upload(
  state: &AppState<SqliteStore>,
  token: &str,
  body: Vec<u8>,
  boundary: &str,
) -> Response {
  let request = Request::builder()
    .method("POST")
    .uri("/api/farmer/photos")
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .header(
      header::CONTENT_TYPE,
      format!("multipart/form-data; boundary={boundary}"),
    )
    .body(Body::from(body))
    .unwrap();
  router(state.clone()).oneshot(request).await.unwrap()
}

#[tokio::test]
async fn photo_upload_hashes_stores_and_serves_the_file() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;

  let image = b"not-really-jpeg-bytes-but-good-enough";
  let boundary = "krishi-test-boundary";
  let mut body = Vec::new();
  push_part(&mut body, boundary, "photo", Some(("field.jpg", "image/jpeg")), image);
  push_part(&mut body, boundary, "latitude", None, b"19.9975");
  push_part(&mut body, boundary, "longitude", None, b"73.7898");
  body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

  let response = upload(&state, &farmer, body, boundary).await;
  assert_eq!(response.status(), StatusCode::CREATED);
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let photo: Value = serde_json::from_slice(&bytes).unwrap();

  assert_eq!(
    photo["content_hash"].as_str().unwrap(),
    hex::encode(Sha256::digest(image))
  );
  assert_eq!(photo["media_type"], "image/jpeg");
  assert_eq!(photo["uploaded_by"], "farmer");
  assert_eq!(photo["location"]["latitude"], 19.9975);
  assert_eq!(photo["location"]["longitude"], 73.7898);
  let path = photo["path"].as_str().unwrap();
  assert!(path.ends_with(".jpg"), "{path}");
  assert!(photo["url"].as_str().unwrap().ends_with(path));

  // the stored file round-trips through /uploads
  let response = send_raw(&state, "GET", &format!("/uploads/{path}"), None, None).await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
  let served = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  assert_eq!(&served[..], image.as_slice());

  // the listing carries the public url
  let (_, photos) = send(&state, "GET", "/api/farmer/photos", Some(&farmer), None).await;
  let listed = photos.as_array().unwrap();
  assert_eq!(listed.len(), 1);
  assert!(listed[0]["url"].as_str().unwrap().ends_with(path));

  // traversal attempts read as unknown uploads
  let response = send_raw(&state, "GET", "/uploads/..%2Fkrishi.db", None, None).await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn photo_upload_validates_its_parts() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, farmer) = create_farmer(&state, &exec, "9812345678").await;
  let boundary = "krishi-test-boundary";

  // no photo part at all
  let mut body = Vec::new();
  push_part(&mut body, boundary, "latitude", None, b"19.9975");
  body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
  let response = upload(&state, &farmer, body, boundary).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let error: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(error["field"], "photo");

  // latitude without longitude
  let mut body = Vec::new();
  push_part(&mut body, boundary, "photo", Some(("a.png", "image/png")), b"png-ish");
  push_part(&mut body, boundary, "latitude", None, b"19.9975");
  body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
  let response = upload(&state, &farmer, body, boundary).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let error: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(error["field"], "location");
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn farmer_register_downloads_as_a_pdf_attachment() {
  let state = state().await;
  let admin = seed_admin(&state).await;
  let (_, exec1) = create_executive(&state, &admin, "ravi@krishi.example").await;
  let (_, exec2) = create_executive(&state, &admin, "meena@krishi.example").await;
  create_farmer(&state, &exec1, "9812345678").await;

  let response = send_raw(&state, "GET", "/api/admin/reports/farmers", Some(&admin), None).await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
  assert_eq!(
    response.headers()[header::CONTENT_DISPOSITION],
    "attachment; filename=\"farmer-register.pdf\""
  );
  let pdf = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  assert!(pdf.starts_with(b"%PDF-1.4"));
  assert!(contains(&pdf, b"Asha Devi"));

  // the executive register is scoped to their own farmers
  let response = send_raw(
    &state,
    "GET",
    "/api/executive/reports/farmers",
    Some(&exec2),
    None,
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(
    response.headers()[header::CONTENT_DISPOSITION],
    "attachment; filename=\"assigned-farmers.pdf\""
  );
  let pdf = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  assert!(pdf.starts_with(b"%PDF-1.4"));
  assert!(!contains(&pdf, b"Asha Devi"));
}
