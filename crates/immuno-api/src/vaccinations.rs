//! Handlers for dose records.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/patients/:id/vaccinations` | Optional `?vaccine_id=`; newest first |
//! | `POST` | `/patients/:id/vaccinations` | Body: [`NewDoseBody`]; 201, 409 if the regimen is complete, 422 if the stock expired |
//! | `GET`  | `/vaccinations/:record_id` | Single record |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use immuno_core::{
  catalog::{StockId, VaccineId},
  history::{PatientId, VaccinationRecord, VitalSigns},
  session::Operator,
  schedule::today,
  store::ImmunizationStore,
  submission::DoseInput,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub vaccine_id: Option<VaccineId>,
}

/// `GET /patients/:id/vaccinations[?vaccine_id=<id>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(patient_id): Path<PatientId>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<VaccinationRecord>>, ApiError>
where
  S: ImmunizationStore,
{
  let records = store
    .patient_history(patient_id, params.vaccine_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Record ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /patients/:id/vaccinations`.
#[derive(Debug, Deserialize)]
pub struct NewDoseBody {
  pub stock_id:              StockId,
  /// Defaults to today (UTC).
  pub administered_on:       Option<NaiveDate>,
  #[serde(default)]
  pub vitals:                VitalSigns,
  pub follow_up_date:        Option<NaiveDate>,
  pub follow_up_description: Option<String>,
  pub remarks:               Option<String>,
}

impl From<NewDoseBody> for DoseInput {
  fn from(b: NewDoseBody) -> Self {
    DoseInput {
      administered_on:       b.administered_on.unwrap_or_else(today),
      vitals:                b.vitals,
      follow_up_date:        b.follow_up_date,
      follow_up_description: b.follow_up_description,
      remarks:               b.remarks,
    }
  }
}

/// `POST /patients/:id/vaccinations`: the store derives the dose number from
/// the stored history and records the dose on behalf of `operator` in one
/// step.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Extension(operator): Extension<Operator>,
  Path(patient_id): Path<PatientId>,
  Json(body): Json<NewDoseBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ImmunizationStore,
{
  let entry = store
    .get_stock(body.stock_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("stock {} not found", body.stock_id)))?;

  let (stock_id, vaccine) = (entry.stock_id, entry.name.clone());
  let record = store
    .record_next_dose(patient_id, entry, DoseInput::from(body), operator.clone())
    .await
    .map_err(ApiError::store)
    .inspect_err(|e| {
      if !matches!(e, ApiError::Store(_)) {
        tracing::warn!(patient = %patient_id, stock_id = %stock_id, "dose rejected: {e}");
      }
    })?;

  tracing::info!(
    patient = %patient_id,
    vaccine = %vaccine,
    dose = record.dose.dose_number,
    operator = %operator.username,
    "dose recorded"
  );
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /vaccinations/:record_id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(record_id): Path<Uuid>,
) -> Result<Json<VaccinationRecord>, ApiError>
where
  S: ImmunizationStore,
{
  let record = store
    .get_record(record_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("vaccination {record_id} not found")))?;
  Ok(Json(record))
}
