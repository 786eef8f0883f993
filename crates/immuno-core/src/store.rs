//! The `ImmunizationStore` trait.
//!
//! Implemented by storage backends (e.g. `immuno-store-sqlite`). The API
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  catalog::{StockId, VaccineCatalogEntry, VaccineId},
  history::{NewVaccinationRecord, PatientId, VaccinationRecord},
  session::Operator,
  submission::DoseInput,
};

/// What callers need to know about a backend error beyond its message.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The scheduling rule that refused a dose, if that is why the write failed.
  fn rejection(&self) -> Option<&crate::Error>;

  /// The write targeted a write-once entry that already exists.
  fn is_conflict(&self) -> bool;
}

/// Abstraction over an immunization record backend.
///
/// Catalog entries are write-once and dose records are append-only; there
/// are no update or delete operations.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ImmunizationStore: Send + Sync {
  type Error: StoreError;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Register a stock entry. Returns an error whose
  /// [`is_conflict`](StoreError::is_conflict) is set if the stock id is
  /// already registered.
  fn register_stock(
    &self,
    entry: VaccineCatalogEntry,
  ) -> impl Future<Output = Result<VaccineCatalogEntry, Self::Error>> + Send + '_;

  /// Retrieve a stock entry. Returns `None` if not found.
  fn get_stock(
    &self,
    stock_id: StockId,
  ) -> impl Future<Output = Result<Option<VaccineCatalogEntry>, Self::Error>>
  + Send
  + '_;

  /// List all registered stock, ordered by stock id.
  fn list_stock(
    &self,
  ) -> impl Future<Output = Result<Vec<VaccineCatalogEntry>, Self::Error>> + Send + '_;

  // ── Doses (append-only writes) ────────────────────────────────────────

  /// Persist an already-built dose as given, without consulting the
  /// patient's history. `record_id` and `recorded_at` are set by the store.
  fn record_dose(
    &self,
    input: NewVaccinationRecord,
  ) -> impl Future<Output = Result<VaccinationRecord, Self::Error>> + Send + '_;

  /// Derive the next dose of `entry` from the stored history and persist it,
  /// atomically with respect to every other write. A completed regimen or an
  /// expired lot is refused with an error whose
  /// [`rejection`](StoreError::rejection) is set, and nothing is written.
  fn record_next_dose(
    &self,
    patient_id: PatientId,
    entry: VaccineCatalogEntry,
    input: DoseInput,
    operator: Operator,
  ) -> impl Future<Output = Result<VaccinationRecord, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get_record(
    &self,
    record_id: Uuid,
  ) -> impl Future<Output = Result<Option<VaccinationRecord>, Self::Error>>
  + Send
  + '_;

  /// All of a patient's doses, newest administration first, optionally
  /// restricted to one vaccine (across all of its lots).
  fn patient_history(
    &self,
    patient_id: PatientId,
    vaccine_id: Option<VaccineId>,
  ) -> impl Future<Output = Result<Vec<VaccinationRecord>, Self::Error>> + Send + '_;
}
