//! Turning a derived schedule and the operator's form input into a dose
//! record ready for the store.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
  Error, Result,
  catalog::{Dosing, VaccineCatalogEntry},
  history::{DoseRecord, NewVaccinationRecord, PatientId, VitalSigns},
  schedule::{DerivedScheduleState, default_description, derive_schedule},
  session::Operator,
};

/// What the operator enters on the dose form besides the vaccine itself.
#[derive(Debug, Clone, Deserialize)]
pub struct DoseInput {
  pub administered_on:       NaiveDate,
  #[serde(default)]
  pub vitals:                VitalSigns,
  /// Required in practice for conditional vaccines; overrides the derived
  /// date for the others.
  pub follow_up_date:        Option<NaiveDate>,
  pub follow_up_description: Option<String>,
  pub remarks:               Option<String>,
}

impl DoseInput {
  pub fn on(administered_on: NaiveDate) -> Self {
    Self {
      administered_on,
      vitals: VitalSigns::default(),
      follow_up_date: None,
      follow_up_description: None,
      remarks: None,
    }
  }
}

/// Merge `state` with the operator's input.
///
/// Fails if the regimen is already complete or the lot expired before the
/// administration date.
pub fn build_record(
  patient_id: PatientId,
  entry: &VaccineCatalogEntry,
  state: &DerivedScheduleState,
  input: DoseInput,
  operator: &Operator,
) -> Result<NewVaccinationRecord> {
  state.ensure_open(entry)?;

  if let Some(expired_on) = entry.expiry_date
    && entry.is_expired_on(input.administered_on)
  {
    return Err(Error::StockExpired {
      stock_id: entry.stock_id,
      vaccine: entry.name.clone(),
      expired_on,
    });
  }

  let follow_up_date = match entry.dosing {
    Dosing::Conditional => input.follow_up_date,
    Dosing::Routine { .. } | Dosing::Primary { .. } => {
      input.follow_up_date.or(state.follow_up_date)
    }
  };

  let follow_up_description = input
    .follow_up_description
    .filter(|text| !text.trim().is_empty())
    .or_else(|| state.follow_up_description.clone())
    .or_else(|| {
      follow_up_date.map(|_| default_description(entry.dosing.kind(), &entry.name))
    });

  Ok(NewVaccinationRecord {
    patient_id,
    dose: DoseRecord {
      vaccine_id:      entry.vaccine_id,
      stock_id:        entry.stock_id,
      dose_number:     state.dose_number,
      administered_on: input.administered_on,
      total_doses:     entry.total_doses,
    },
    follow_up_date,
    follow_up_description,
    vitals: input.vitals,
    remarks: input.remarks,
    recorded_by: operator.username.clone(),
  })
}

/// Derive the schedule as of the administration date and build the record in
/// one step. `history` must be restricted to the entry's vaccine.
pub fn prepare_dose<'a, I>(
  patient_id: PatientId,
  entry: &VaccineCatalogEntry,
  history: I,
  input: DoseInput,
  operator: &Operator,
) -> Result<NewVaccinationRecord>
where
  I: IntoIterator<Item = &'a DoseRecord>,
{
  let state = derive_schedule(entry, history, input.administered_on);
  build_record(patient_id, entry, &state, input, operator)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{DoseInterval, StockId, TimeUnit, VaccineId};

  fn on(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn opv(dosing: Dosing) -> VaccineCatalogEntry {
    VaccineCatalogEntry {
      stock_id: StockId(3),
      vaccine_id: VaccineId(30),
      name: "OPV".into(),
      expiry_date: Some(on(2026, 12, 31)),
      total_doses: 3,
      dosing,
    }
  }

  fn four_weeks_apart() -> Dosing {
    Dosing::Primary {
      intervals: vec![
        DoseInterval { dose_number: 2, interval: 4, time_unit: TimeUnit::Week },
        DoseInterval { dose_number: 3, interval: 4, time_unit: TimeUnit::Week },
      ],
    }
  }

  fn given(n: u32) -> DoseRecord {
    DoseRecord {
      vaccine_id:      VaccineId(30),
      stock_id:        StockId(3),
      dose_number:     n,
      administered_on: on(2026, 6, 1),
      total_doses:     3,
    }
  }

  fn bhw() -> Operator { Operator::new("bhw.santos") }

  #[test]
  fn builds_record_from_derived_state() {
    let entry = opv(four_weeks_apart());
    let record = prepare_dose(
      PatientId(9),
      &entry,
      &[given(1)],
      DoseInput::on(on(2026, 10, 14)),
      &bhw(),
    )
    .unwrap();

    assert_eq!(record.dose.dose_number, 2);
    assert_eq!(record.dose.total_doses, 3);
    assert_eq!(record.follow_up_date, Some(on(2026, 11, 11)));
    assert_eq!(record.follow_up_description.as_deref(), Some("Vaccination for OPV"));
    assert_eq!(record.recorded_by, "bhw.santos");
  }

  #[test]
  fn completed_regimen_is_rejected() {
    let entry = opv(four_weeks_apart());
    let err = prepare_dose(
      PatientId(9),
      &entry,
      &[given(1), given(2), given(3)],
      DoseInput::on(on(2026, 10, 14)),
      &bhw(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::RegimenComplete { dose: 4, total: 3, .. }));
  }

  #[test]
  fn expired_stock_is_rejected() {
    let entry = opv(four_weeks_apart());
    let err = prepare_dose(
      PatientId(9),
      &entry,
      &[],
      DoseInput::on(on(2027, 1, 1)),
      &bhw(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::StockExpired { stock_id: StockId(3), .. }));
  }

  #[test]
  fn conditional_takes_operator_date_and_default_description() {
    let entry = opv(Dosing::Conditional);
    let mut input = DoseInput::on(on(2026, 10, 14));
    input.follow_up_date = Some(on(2026, 10, 28));
    input.follow_up_description = Some("   ".into());

    let record = prepare_dose(PatientId(9), &entry, &[], input, &bhw()).unwrap();
    assert_eq!(record.follow_up_date, Some(on(2026, 10, 28)));
    assert_eq!(
      record.follow_up_description.as_deref(),
      Some("Conditional vaccination follow-up for OPV."),
    );
  }

  #[test]
  fn operator_date_overrides_derived_date() {
    let entry = opv(four_weeks_apart());
    let mut input = DoseInput::on(on(2026, 10, 14));
    input.follow_up_date = Some(on(2026, 12, 1));
    input.follow_up_description = Some("Bring baby book".into());

    let record = prepare_dose(PatientId(9), &entry, &[], input, &bhw()).unwrap();
    assert_eq!(record.follow_up_date, Some(on(2026, 12, 1)));
    assert_eq!(record.follow_up_description.as_deref(), Some("Bring baby book"));
  }

  #[test]
  fn date_without_derived_description_gets_default() {
    let entry = opv(Dosing::Primary { intervals: vec![] });
    let mut input = DoseInput::on(on(2026, 10, 14));
    input.follow_up_date = Some(on(2026, 11, 14));

    let record = prepare_dose(PatientId(9), &entry, &[], input, &bhw()).unwrap();
    assert_eq!(record.follow_up_description.as_deref(), Some("Vaccination for OPV"));
  }
}
