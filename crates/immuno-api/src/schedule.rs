//! `GET /patients/:id/schedule`: preview of the dose scheduler for one
//! stock selection.
//!
//! The dose form calls this whenever the operator picks a vaccine. The
//! response carries the derived schedule plus the warning to show when the
//! regimen is already complete.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use immuno_core::{
  catalog::{StockId, VaccineSelection},
  history::PatientId,
  schedule::{DerivedScheduleState, derive_for_patient, today},
  store::ImmunizationStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ScheduleParams {
  pub stock_id: StockId,
  /// Reference date for follow-up arithmetic. Defaults to today (UTC).
  pub on:       Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
  pub selection: VaccineSelection,
  pub reference: NaiveDate,
  #[serde(flatten)]
  pub state:     DerivedScheduleState,
  /// Present only when `completed` is true.
  pub warning:   Option<String>,
}

/// `GET /patients/:id/schedule?stock_id=<id>[&on=YYYY-MM-DD]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Path(patient_id): Path<PatientId>,
  Query(params): Query<ScheduleParams>,
) -> Result<Json<ScheduleResponse>, ApiError>
where
  S: ImmunizationStore,
{
  let entry = store
    .get_stock(params.stock_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("stock {} not found", params.stock_id)))?;

  let history = store
    .patient_history(patient_id, Some(entry.vaccine_id))
    .await
    .map_err(ApiError::store)?;

  let reference = params.on.unwrap_or_else(today);
  let state = derive_for_patient(&entry, &history, reference);
  let warning = state.completion_warning(&entry);

  tracing::debug!(
    patient = %patient_id,
    stock_id = %entry.stock_id,
    dose = state.dose_number,
    completed = state.completed,
    "schedule derived"
  );

  Ok(Json(ScheduleResponse {
    selection: entry.selection(),
    reference,
    state,
    warning,
  }))
}
