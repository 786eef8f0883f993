//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, the
//! dosing regimen and vital signs are compact JSON, and UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use immuno_core::{
  catalog::{Dosing, StockId, VaccineCatalogEntry, VaccineId},
  history::{DoseRecord, PatientId, VaccinationRecord, VitalSigns},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_dosing(d: &Dosing) -> Result<String> { Ok(serde_json::to_string(d)?) }

pub fn decode_dosing(s: &str) -> Result<Dosing> { Ok(serde_json::from_str(s)?) }

pub fn encode_vitals(v: &VitalSigns) -> Result<String> {
  Ok(serde_json::to_string(v)?)
}

pub fn decode_vitals(s: &str) -> Result<VitalSigns> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `stock` row.
pub struct RawStock {
  pub stock_id:    i64,
  pub vaccine_id:  i64,
  pub name:        String,
  pub expiry_date: Option<String>,
  pub total_doses: u32,
  pub dosing_json: String,
}

impl RawStock {
  pub const COLUMNS: &'static str =
    "stock_id, vaccine_id, name, expiry_date, total_doses, dosing_json";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      stock_id:    row.get(0)?,
      vaccine_id:  row.get(1)?,
      name:        row.get(2)?,
      expiry_date: row.get(3)?,
      total_doses: row.get(4)?,
      dosing_json: row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<VaccineCatalogEntry> {
    Ok(VaccineCatalogEntry {
      stock_id:    StockId(self.stock_id),
      vaccine_id:  VaccineId(self.vaccine_id),
      name:        self.name,
      expiry_date: self.expiry_date.as_deref().map(decode_date).transpose()?,
      total_doses: self.total_doses,
      dosing:      decode_dosing(&self.dosing_json)?,
    })
  }
}

/// Raw values read directly from a `vaccinations` row.
pub struct RawVaccination {
  pub record_id:             String,
  pub patient_id:            i64,
  pub vaccine_id:            i64,
  pub stock_id:              i64,
  pub dose_number:           u32,
  pub administered_on:       String,
  pub total_doses:           u32,
  pub follow_up_date:        Option<String>,
  pub follow_up_description: Option<String>,
  pub vitals_json:           String,
  pub remarks:               Option<String>,
  pub recorded_by:           String,
  pub recorded_at:           String,
}

impl RawVaccination {
  pub const COLUMNS: &'static str = "record_id, patient_id, vaccine_id, stock_id,
     dose_number, administered_on, total_doses, follow_up_date,
     follow_up_description, vitals_json, remarks, recorded_by, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:             row.get(0)?,
      patient_id:            row.get(1)?,
      vaccine_id:            row.get(2)?,
      stock_id:              row.get(3)?,
      dose_number:           row.get(4)?,
      administered_on:       row.get(5)?,
      total_doses:           row.get(6)?,
      follow_up_date:        row.get(7)?,
      follow_up_description: row.get(8)?,
      vitals_json:           row.get(9)?,
      remarks:               row.get(10)?,
      recorded_by:           row.get(11)?,
      recorded_at:           row.get(12)?,
    })
  }

  pub fn into_record(self) -> Result<VaccinationRecord> {
    Ok(VaccinationRecord {
      record_id:             decode_uuid(&self.record_id)?,
      patient_id:            PatientId(self.patient_id),
      dose:                  DoseRecord {
        vaccine_id:      VaccineId(self.vaccine_id),
        stock_id:        StockId(self.stock_id),
        dose_number:     self.dose_number,
        administered_on: decode_date(&self.administered_on)?,
        total_doses:     self.total_doses,
      },
      follow_up_date:        self
        .follow_up_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      follow_up_description: self.follow_up_description,
      vitals:                decode_vitals(&self.vitals_json)?,
      remarks:               self.remarks,
      recorded_by:           self.recorded_by,
      recorded_at:           decode_dt(&self.recorded_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_round_trip_as_iso() {
    let d = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    assert_eq!(encode_date(d), "2026-03-09");
    assert_eq!(decode_date("2026-03-09").unwrap(), d);
    assert!(matches!(decode_date("09/03/2026"), Err(Error::DateParse(_))));
  }

  #[test]
  fn bad_timestamp_is_a_date_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
