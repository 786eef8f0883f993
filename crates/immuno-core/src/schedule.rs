//! The dose scheduler.
//!
//! Given the selected catalog entry and the patient's doses of that vaccine,
//! derive which dose is being given now, whether the regimen is already
//! complete, and when the patient should come back. The derivation is a pure
//! function of its inputs and never fails: a missing or unusable interval rule
//! means "no scheduled follow-up".

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  catalog::{Dosing, DosingType, VaccineCatalogEntry},
  history::{DoseRecord, VaccinationRecord, records_for_vaccine},
};

/// The scheduler's output. Held transiently by the dose form and rebuilt on
/// every change of the selected vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedScheduleState {
  /// The dose number to record next.
  pub dose_number:           u32,
  /// The regimen is already complete; the dose must not be recorded.
  pub completed:             bool,
  pub follow_up_date:        Option<NaiveDate>,
  pub follow_up_description: Option<String>,
}

impl DerivedScheduleState {
  /// The error that blocks submission, if the regimen is complete.
  pub fn ensure_open(&self, entry: &VaccineCatalogEntry) -> Result<()> {
    if self.completed {
      return Err(Error::RegimenComplete {
        vaccine: entry.name.clone(),
        dose:    self.dose_number,
        total:   entry.total_doses,
      });
    }
    Ok(())
  }

  /// The warning shown to the operator when the regimen is complete.
  pub fn completion_warning(&self, entry: &VaccineCatalogEntry) -> Option<String> {
    self.ensure_open(entry).err().map(|e| e.to_string())
  }
}

/// Description attached to a scheduled follow-up for routine and primary
/// vaccines.
pub fn follow_up_description(name: &str) -> String {
  format!("Vaccination for {name}")
}

/// Description for conditional vaccines, whose follow-up date the operator
/// chooses.
pub fn conditional_description(name: &str) -> String {
  format!("Conditional vaccination follow-up for {name}.")
}

/// The description used when none is derived or supplied.
pub fn default_description(kind: DosingType, name: &str) -> String {
  match kind {
    DosingType::Conditional => conditional_description(name),
    DosingType::Routine | DosingType::Primary => follow_up_description(name),
  }
}

/// Derive the schedule for `entry` as of `reference_date`.
///
/// `history` must already be restricted to doses of `entry.vaccine_id`; its
/// order does not matter because the next dose follows the highest dose
/// number seen.
pub fn derive_schedule<'a, I>(
  entry: &VaccineCatalogEntry,
  history: I,
  reference_date: NaiveDate,
) -> DerivedScheduleState
where
  I: IntoIterator<Item = &'a DoseRecord>,
{
  let dose_number = match entry.dosing {
    // Seasonal shots do not accumulate a dose count across visits.
    Dosing::Routine { .. } => 1,
    Dosing::Primary { .. } | Dosing::Conditional => history
      .into_iter()
      .map(|record| record.dose_number)
      .max()
      .map_or(1, |highest| highest.saturating_add(1)),
  };

  let completed = !entry.dosing.is_routine()
    && entry.total_doses > 0
    && dose_number > entry.total_doses;

  // The regimen ends at or before this dose.
  if completed || dose_number >= entry.total_doses {
    return DerivedScheduleState {
      dose_number,
      completed,
      follow_up_date: None,
      follow_up_description: None,
    };
  }

  let (follow_up_date, follow_up_description) = match &entry.dosing {
    Dosing::Routine { interval } => {
      match interval.and_then(|rule| rule.after(reference_date)) {
        Some(date) => (Some(date), Some(follow_up_description(&entry.name))),
        None => (None, None),
      }
    }
    Dosing::Primary { .. } => {
      match entry
        .interval_for_dose(dose_number + 1)
        .and_then(|rule| rule.after(reference_date))
      {
        Some(date) => (Some(date), Some(follow_up_description(&entry.name))),
        None => (None, None),
      }
    }
    Dosing::Conditional => (None, Some(conditional_description(&entry.name))),
  };

  DerivedScheduleState {
    dose_number,
    completed,
    follow_up_date,
    follow_up_description,
  }
}

/// The default reference date: today in UTC.
pub fn today() -> NaiveDate { Utc::now().date_naive() }

/// [`derive_schedule`] over a patient's full stored history, filtering to
/// the entry's vaccine first.
pub fn derive_for_patient(
  entry: &VaccineCatalogEntry,
  records: &[VaccinationRecord],
  reference_date: NaiveDate,
) -> DerivedScheduleState {
  let doses = records.iter().map(|record| &record.dose);
  derive_schedule(
    entry,
    records_for_vaccine(doses, entry.vaccine_id),
    reference_date,
  )
}
