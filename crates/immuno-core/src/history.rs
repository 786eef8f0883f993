//! Administered doses.
//!
//! History is append-only: a dose record is written once when the dose is
//! submitted and never updated afterwards.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{StockId, VaccineId};

/// Identifies a patient in the external patient records service.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PatientId(pub i64);

impl fmt::Display for PatientId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Dose record ─────────────────────────────────────────────────────────────

/// One administered dose, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseRecord {
  pub vaccine_id:      VaccineId,
  /// The lot actually used; may differ between doses of the same vaccine.
  pub stock_id:        StockId,
  pub dose_number:     u32,
  pub administered_on: NaiveDate,
  /// The catalog's `total_doses` at the time the dose was given.
  pub total_doses:     u32,
}

/// Keep only the doses of `vaccine_id`.
///
/// Filters by vaccine, not by stock, so that switching to another lot of the
/// same vaccine continues the same dose count.
pub fn records_for_vaccine<'a, I>(
  records: I,
  vaccine_id: VaccineId,
) -> impl Iterator<Item = &'a DoseRecord>
where
  I: IntoIterator<Item = &'a DoseRecord>,
{
  records
    .into_iter()
    .filter(move |record| record.vaccine_id == vaccine_id)
}

// ─── Vital signs ─────────────────────────────────────────────────────────────

/// Measurements the health worker takes alongside the dose. Every field is
/// optional; a worker in the field rarely has all the instruments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
  pub temperature_c: Option<f32>,
  pub weight_kg:     Option<f32>,
  pub height_cm:     Option<f32>,
  pub systolic:      Option<u16>,
  pub diastolic:     Option<u16>,
  pub pulse_bpm:     Option<u16>,
}

// ─── Persisted record ────────────────────────────────────────────────────────

/// A dose as stored. No field changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
  pub record_id:             Uuid,
  pub patient_id:            PatientId,
  #[serde(flatten)]
  pub dose:                  DoseRecord,
  pub follow_up_date:        Option<NaiveDate>,
  pub follow_up_description: Option<String>,
  pub vitals:                VitalSigns,
  pub remarks:               Option<String>,
  /// Username of the operator who submitted the dose.
  pub recorded_by:           String,
  /// Server-assigned; never changes after creation.
  pub recorded_at:           DateTime<Utc>,
}

/// Input to [`crate::store::ImmunizationStore::record_dose`].
/// `record_id` and `recorded_at` are always set by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVaccinationRecord {
  pub patient_id:            PatientId,
  pub dose:                  DoseRecord,
  pub follow_up_date:        Option<NaiveDate>,
  pub follow_up_description: Option<String>,
  pub vitals:                VitalSigns,
  pub remarks:               Option<String>,
  pub recorded_by:           String,
}
