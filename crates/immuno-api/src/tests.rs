//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Extension, Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use immuno_core::session::Operator;
use immuno_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store)).layer(Extension(Operator::new("bhw.cruz")))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn penta_stock(stock_id: i64) -> Value {
  json!({
    "stock_id": stock_id,
    "vac_id": 5,
    "vac_name": "Pentavalent",
    "expiry_date": "2027-12-31",
    "dosing_type": "primary",
    "total_doses": 3,
    "intervals": [
      {"dose_number": 2, "interval": 4, "time_unit": "weeks"},
      {"dose_number": 3, "interval": 4, "time_unit": "weeks"}
    ]
  })
}

async fn dose(app: &Router, patient: i64, stock_id: i64, on: &str) -> (StatusCode, Value) {
  send(
    app,
    "POST",
    &format!("/patients/{patient}/vaccinations"),
    Some(json!({ "stock_id": stock_id, "administered_on": on, "vitals": {"temperature_c": 36.6} })),
  )
  .await
}

// ─── Stock ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_fetch_stock() {
  let app = app().await;
  let (status, created) = send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["dosing"]["dosing_type"], "primary");

  let (status, fetched) = send(&app, "GET", "/stock/1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["name"], "Pentavalent");

  let (_, listed) = send(&app, "GET", "/stock", None).await;
  assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn duplicate_stock_is_a_conflict() {
  let app = app().await;
  send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  let (status, body) = send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("already registered"));
}

#[tokio::test]
async fn malformed_stock_is_a_bad_request() {
  let app = app().await;
  let (status, _) = send(
    &app,
    "POST",
    "/stock",
    Some(json!({"stock_id": 1, "vac_name": "X", "dosing_type": "primary"})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_stock_is_404() {
  let app = app().await;
  let (status, body) = send(&app, "GET", "/stock/99", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "stock 99 not found");
}

// ─── Schedule ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedule_for_new_patient() {
  let app = app().await;
  send(&app, "POST", "/stock", Some(penta_stock(1))).await;

  let (status, body) =
    send(&app, "GET", "/patients/7/schedule?stock_id=1&on=2026-10-14", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["dose_number"], 1);
  assert_eq!(body["completed"], false);
  assert_eq!(body["follow_up_date"], "2026-11-11");
  assert_eq!(body["follow_up_description"], "Vaccination for Pentavalent");
  assert_eq!(body["selection"]["stock_id"], 1);
  assert_eq!(body["warning"], Value::Null);
}

#[tokio::test]
async fn completed_regimen_warns_and_blocks_recording() {
  let app = app().await;
  send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  for on in ["2026-06-01", "2026-07-01", "2026-08-01"] {
    let (status, _) = dose(&app, 7, 1, on).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, preview) =
    send(&app, "GET", "/patients/7/schedule?stock_id=1&on=2026-10-14", None).await;
  assert_eq!(preview["dose_number"], 4);
  assert_eq!(preview["completed"], true);
  assert_eq!(preview["follow_up_date"], Value::Null);
  assert_eq!(preview["warning"], "Pentavalent regimen already completed (dose 4/3)");

  let (status, body) = dose(&app, 7, 1, "2026-10-14").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "Pentavalent regimen already completed (dose 4/3)");

  let (_, history) = send(&app, "GET", "/patients/7/vaccinations", None).await;
  assert_eq!(history.as_array().map(Vec::len), Some(3));
}

// ─── Vaccinations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn switching_lots_continues_the_count() {
  let app = app().await;
  send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  send(&app, "POST", "/stock", Some(penta_stock(2))).await;

  let (_, first) = dose(&app, 7, 1, "2026-08-01").await;
  assert_eq!(first["dose_number"], 1);
  assert_eq!(first["follow_up_date"], "2026-08-29");
  assert_eq!(first["recorded_by"], "bhw.cruz");

  let (_, second) = dose(&app, 7, 2, "2026-09-01").await;
  assert_eq!(second["dose_number"], 2);
  assert_eq!(second["stock_id"], 2);

  let (status, fetched) = send(
    &app,
    "GET",
    &format!("/vaccinations/{}", second["record_id"].as_str().unwrap()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["vitals"]["temperature_c"], 36.6);
}

#[tokio::test]
async fn expired_stock_is_unprocessable() {
  let app = app().await;
  let mut stock = penta_stock(1);
  stock["expiry_date"] = json!("2026-01-31");
  send(&app, "POST", "/stock", Some(stock)).await;

  let (status, _) = dose(&app, 7, 1, "2026-02-01").await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dose_for_unknown_stock_is_404() {
  let app = app().await;
  let (status, _) = dose(&app, 7, 42, "2026-02-01").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_filters_by_vaccine() {
  let app = app().await;
  send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  send(
    &app,
    "POST",
    "/stock",
    Some(json!({
      "stock_id": 2, "vac_id": 6, "vac_name": "Influenza",
      "dosing_type": "routine", "total_doses": 1,
      "interval": 1, "time_unit": "year"
    })),
  )
  .await;
  dose(&app, 7, 1, "2026-08-01").await;
  dose(&app, 7, 2, "2026-08-01").await;

  let (_, flu) = send(&app, "GET", "/patients/7/vaccinations?vaccine_id=6", None).await;
  let flu = flu.as_array().unwrap();
  assert_eq!(flu.len(), 1);
  assert_eq!(flu[0]["dose_number"], 1);
}

// ─── Simultaneous submissions ────────────────────────────────────────────────

#[tokio::test]
async fn simultaneous_last_doses_record_only_one() {
  let app = app().await;
  send(&app, "POST", "/stock", Some(penta_stock(1))).await;
  dose(&app, 7, 1, "2026-08-01").await;
  dose(&app, 7, 1, "2026-09-01").await;

  let ((a, _), (b, _)) = tokio::join!(
    dose(&app, 7, 1, "2026-10-01"),
    dose(&app, 7, 1, "2026-10-01"),
  );
  let mut statuses = [a, b];
  statuses.sort();
  assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

  let (_, history) = send(&app, "GET", "/patients/7/vaccinations", None).await;
  let doses: Vec<u64> = history
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["dose_number"].as_u64().unwrap())
    .collect();
  assert_eq!(doses, vec![3, 2, 1]);
}

#[tokio::test]
async fn simultaneous_registrations_conflict_instead_of_failing() {
  let app = app().await;
  let ((a, _), (b, body_b)) = tokio::join!(
    send(&app, "POST", "/stock", Some(penta_stock(1))),
    send(&app, "POST", "/stock", Some(penta_stock(1))),
  );
  let mut statuses = [a, b];
  statuses.sort();
  assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
  if b == StatusCode::CONFLICT {
    assert_eq!(body_b["error"], "stock 1 is already registered");
  }
}
