//! The SQLite implementation of [`ImmunizationStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use immuno_core::{
  catalog::{StockId, VaccineCatalogEntry, VaccineId},
  history::{NewVaccinationRecord, PatientId, VaccinationRecord},
  session::Operator,
  store::ImmunizationStore,
  submission::{DoseInput, prepare_dose},
};

use crate::{
  Error, Result,
  encode::{
    RawStock, RawVaccination, encode_date, encode_dosing, encode_dt, encode_uuid,
    encode_vitals,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An immunization store backed by a single SQLite file.
///
/// Clones share the same reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row writes ──────────────────────────────────────────────────────────────

/// Give a new dose its store-assigned identity.
fn stamp(input: NewVaccinationRecord) -> VaccinationRecord {
  VaccinationRecord {
    record_id:             Uuid::new_v4(),
    patient_id:            input.patient_id,
    dose:                  input.dose,
    follow_up_date:        input.follow_up_date,
    follow_up_description: input.follow_up_description,
    vitals:                input.vitals,
    remarks:               input.remarks,
    recorded_by:           input.recorded_by,
    recorded_at:           Utc::now(),
  }
}

/// Insert `record` into `vaccinations`. `vitals_json` is the encoded
/// `record.vitals`.
fn insert_row(
  conn: &rusqlite::Connection,
  record: &VaccinationRecord,
  vitals_json: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO vaccinations (
       record_id, patient_id, vaccine_id, stock_id, dose_number,
       administered_on, total_doses, follow_up_date,
       follow_up_description, vitals_json, remarks,
       recorded_by, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    rusqlite::params![
      encode_uuid(record.record_id),
      record.patient_id.0,
      record.dose.vaccine_id.0,
      record.dose.stock_id.0,
      record.dose.dose_number,
      encode_date(record.dose.administered_on),
      record.dose.total_doses,
      record.follow_up_date.map(encode_date),
      record.follow_up_description,
      vitals_json,
      record.remarks,
      record.recorded_by,
      encode_dt(record.recorded_at),
    ],
  )?;
  Ok(())
}

/// Build the next dose from the rows already stored for this patient and
/// vaccine.
fn next_dose(
  patient_id: PatientId,
  entry: &VaccineCatalogEntry,
  rows: Vec<RawVaccination>,
  input: DoseInput,
  operator: &Operator,
) -> Result<VaccinationRecord> {
  let history = rows
    .into_iter()
    .map(RawVaccination::into_record)
    .collect::<Result<Vec<_>>>()?;
  let new = prepare_dose(
    patient_id,
    entry,
    history.iter().map(|record| &record.dose),
    input,
    operator,
  )?;
  Ok(stamp(new))
}

// ─── ImmunizationStore impl ──────────────────────────────────────────────────

impl ImmunizationStore for SqliteStore {
  type Error = Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn register_stock(
    &self,
    entry: VaccineCatalogEntry,
  ) -> Result<VaccineCatalogEntry> {
    let stock_id      = entry.stock_id.0;
    let vaccine_id    = entry.vaccine_id.0;
    let name          = entry.name.clone();
    let expiry_date   = entry.expiry_date.map(encode_date);
    let total_doses   = entry.total_doses;
    let dosing_json   = encode_dosing(&entry.dosing)?;
    let registered_at = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO stock (
             stock_id, vaccine_id, name, expiry_date, total_doses,
             dosing_json, registered_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (stock_id) DO NOTHING",
          rusqlite::params![
            stock_id,
            vaccine_id,
            name,
            expiry_date,
            total_doses,
            dosing_json,
            registered_at,
          ],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      tracing::warn!(stock_id = %entry.stock_id, "stock already registered");
      return Err(Error::StockExists(entry.stock_id));
    }
    tracing::debug!(stock_id = %entry.stock_id, vaccine = %entry.name, "stock stored");
    Ok(entry)
  }

  async fn get_stock(&self, stock_id: StockId) -> Result<Option<VaccineCatalogEntry>> {
    let raw: Option<RawStock> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM stock WHERE stock_id = ?1", RawStock::COLUMNS),
              rusqlite::params![stock_id.0],
              RawStock::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStock::into_entry).transpose()
  }

  async fn list_stock(&self) -> Result<Vec<VaccineCatalogEntry>> {
    let raws: Vec<RawStock> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM stock ORDER BY stock_id",
          RawStock::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawStock::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStock::into_entry).collect()
  }

  // ── Doses (append-only writes) ────────────────────────────────────────────

  async fn record_dose(&self, input: NewVaccinationRecord) -> Result<VaccinationRecord> {
    let vitals_json = encode_vitals(&input.vitals)?;
    let record = stamp(input);

    let record = self
      .conn
      .call(move |conn| {
        insert_row(conn, &record, &vitals_json)?;
        Ok(record)
      })
      .await?;

    tracing::debug!(
      record_id = %record.record_id,
      patient = %record.patient_id,
      dose = record.dose.dose_number,
      "dose stored"
    );
    Ok(record)
  }

  async fn record_next_dose(
    &self,
    patient_id: PatientId,
    entry: VaccineCatalogEntry,
    input: DoseInput,
    operator: Operator,
  ) -> Result<VaccinationRecord> {
    let vitals_json = encode_vitals(&input.vitals)?;
    let stock_id = entry.stock_id;

    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE: the write lock is held from the history read to the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {} FROM vaccinations WHERE patient_id = ?1 AND vaccine_id = ?2",
            RawVaccination::COLUMNS
          ))?;
          let rows = stmt
            .query_map(
              rusqlite::params![patient_id.0, entry.vaccine_id.0],
              RawVaccination::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };

        let record = match next_dose(patient_id, &entry, rows, input, &operator) {
          Ok(record) => record,
          // Dropping `tx` rolls back.
          Err(e) => return Ok(Err(e)),
        };
        insert_row(&tx, &record, &vitals_json)?;
        tx.commit()?;
        Ok(Ok(record))
      })
      .await?;

    let record = outcome.inspect_err(|e| {
      tracing::debug!(patient = %patient_id, stock_id = %stock_id, "dose not stored: {e}");
    })?;
    tracing::debug!(
      record_id = %record.record_id,
      patient = %patient_id,
      stock_id = %stock_id,
      dose = record.dose.dose_number,
      "next dose stored"
    );
    Ok(record)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_record(&self, record_id: Uuid) -> Result<Option<VaccinationRecord>> {
    let id_str = encode_uuid(record_id);

    let raw: Option<RawVaccination> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM vaccinations WHERE record_id = ?1",
                RawVaccination::COLUMNS
              ),
              rusqlite::params![id_str],
              RawVaccination::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVaccination::into_record).transpose()
  }

  async fn patient_history(
    &self,
    patient_id: PatientId,
    vaccine_id: Option<VaccineId>,
  ) -> Result<Vec<VaccinationRecord>> {
    let vaccine = vaccine_id.map(|v| v.0);

    let raws: Vec<RawVaccination> = self
      .conn
      .call(move |conn| {
        // `?2 IS NULL` disables the vaccine filter.
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM vaccinations
           WHERE patient_id = ?1
             AND (?2 IS NULL OR vaccine_id = ?2)
           ORDER BY administered_on DESC, dose_number DESC, recorded_at DESC",
          RawVaccination::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![patient_id.0, vaccine], RawVaccination::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVaccination::into_record).collect()
  }
}
