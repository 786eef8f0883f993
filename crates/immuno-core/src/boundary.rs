//! Parsing of loosely-shaped backend JSON into typed records.
//!
//! The inventory and patient services send ids as numbers or strings, dates
//! with or without a time part, and leave fields out freely. The `Raw*`
//! structs accept all of that; their `TryFrom` impls produce fully-typed,
//! already-defaulted records so nothing downstream has to guess.
//!
//! Scheduling metadata fails soft: a missing or unusable interval rule is
//! dropped and the entry simply has no follow-up for that dose.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::{
  Error, Result,
  catalog::{
    DoseInterval, Dosing, DosingType, IntervalRule, StockId, TimeUnit,
    VaccineCatalogEntry, VaccineId,
  },
  history::DoseRecord,
};

// ─── Scalars ─────────────────────────────────────────────────────────────────

/// An identifier or count that may arrive as a JSON number or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
  Int(i64),
  Text(String),
}

impl RawNumber {
  fn to_i64(&self) -> Option<i64> {
    match self {
      Self::Int(n) => Some(*n),
      Self::Text(s) => s.trim().parse().ok(),
    }
  }
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp. Blank
/// strings are treated as absent.
pub fn parse_date(raw: &str) -> Option<std::result::Result<NaiveDate, String>> {
  let s = raw.trim();
  if s.is_empty() {
    return None;
  }
  let parsed = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
    .map_err(|_| format!("unparseable date: {s:?}"));
  Some(parsed)
}

fn non_negative_u32(value: i64) -> Option<u32> { u32::try_from(value).ok() }

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDoseInterval {
  pub dose_number: Option<RawNumber>,
  pub interval:    Option<RawNumber>,
  pub time_unit:   Option<String>,
}

impl RawDoseInterval {
  fn parse(&self) -> Option<DoseInterval> {
    Some(DoseInterval {
      dose_number: non_negative_u32(self.dose_number.as_ref()?.to_i64()?)?,
      interval:    non_negative_u32(self.interval.as_ref()?.to_i64()?)?,
      time_unit:   self.time_unit.as_deref()?.parse::<TimeUnit>().ok()?,
    })
  }
}

/// A catalog entry as the inventory service sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalogEntry {
  pub stock_id:    Option<RawNumber>,
  #[serde(alias = "vac_id")]
  pub vaccine_id:  Option<RawNumber>,
  #[serde(alias = "vac_name")]
  pub name:        Option<String>,
  pub expiry_date: Option<String>,
  pub dosing_type: Option<String>,
  pub total_doses: Option<RawNumber>,
  /// Routine rule, flattened onto the entry.
  pub interval:    Option<RawNumber>,
  pub time_unit:   Option<String>,
  /// Primary-series rules.
  #[serde(default)]
  pub intervals:   Vec<RawDoseInterval>,
}

impl TryFrom<RawCatalogEntry> for VaccineCatalogEntry {
  type Error = Error;

  fn try_from(raw: RawCatalogEntry) -> Result<Self> {
    let invalid = |msg: &str| Error::InvalidCatalogEntry(msg.to_owned());

    let stock_id = raw
      .stock_id
      .as_ref()
      .and_then(RawNumber::to_i64)
      .map(StockId)
      .ok_or_else(|| invalid("missing or non-numeric stock_id"))?;

    let vaccine_id = raw
      .vaccine_id
      .as_ref()
      .and_then(RawNumber::to_i64)
      .map(VaccineId)
      .ok_or_else(|| invalid("missing or non-numeric vaccine_id"))?;

    let name = raw
      .name
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty())
      .ok_or_else(|| invalid("missing vaccine name"))?;

    let expiry_date = raw
      .expiry_date
      .as_deref()
      .and_then(parse_date)
      .transpose()
      .map_err(Error::InvalidCatalogEntry)?;

    let kind: DosingType = raw
      .dosing_type
      .as_deref()
      .ok_or_else(|| invalid("missing dosing_type"))?
      .parse::<DosingType>()
      .map_err(Error::InvalidCatalogEntry)?;

    // Absent means "never completable"; negative is corrupt data.
    let total_doses = match raw.total_doses.as_ref() {
      None => 0,
      Some(n) => n
        .to_i64()
        .and_then(non_negative_u32)
        .ok_or_else(|| invalid("total_doses must be a non-negative integer"))?,
    };

    let dosing = match kind {
      DosingType::Routine => {
        let interval = raw
          .interval
          .as_ref()
          .and_then(RawNumber::to_i64)
          .and_then(non_negative_u32);
        let time_unit = raw
          .time_unit
          .as_deref()
          .and_then(|u| u.parse::<TimeUnit>().ok());
        Dosing::Routine {
          interval: interval
            .zip(time_unit)
            .map(|(interval, time_unit)| IntervalRule { interval, time_unit }),
        }
      }
      DosingType::Primary => {
        let mut intervals: Vec<DoseInterval> =
          raw.intervals.iter().filter_map(RawDoseInterval::parse).collect();
        intervals.sort_by_key(|rule| rule.dose_number);
        Dosing::Primary { intervals }
      }
      DosingType::Conditional => Dosing::Conditional,
    };

    Ok(VaccineCatalogEntry {
      stock_id,
      vaccine_id,
      name,
      expiry_date,
      total_doses,
      dosing,
    })
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// A dose record as the patient records service sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDoseRecord {
  #[serde(alias = "vac_id")]
  pub vaccine_id:      Option<RawNumber>,
  pub stock_id:        Option<RawNumber>,
  #[serde(alias = "dose_no")]
  pub dose_number:     Option<RawNumber>,
  #[serde(alias = "date_administered", alias = "date")]
  pub administered_on: Option<String>,
  pub total_doses:     Option<RawNumber>,
}

impl TryFrom<RawDoseRecord> for DoseRecord {
  type Error = Error;

  fn try_from(raw: RawDoseRecord) -> Result<Self> {
    let invalid = |msg: &str| Error::InvalidDoseRecord(msg.to_owned());

    let vaccine_id = raw
      .vaccine_id
      .as_ref()
      .and_then(RawNumber::to_i64)
      .map(VaccineId)
      .ok_or_else(|| invalid("missing or non-numeric vaccine_id"))?;

    // Older records predate lot tracking; stock 0 stands for "unknown lot".
    let stock_id = raw
      .stock_id
      .as_ref()
      .and_then(RawNumber::to_i64)
      .map_or(StockId(0), StockId);

    let dose_number = raw
      .dose_number
      .as_ref()
      .and_then(RawNumber::to_i64)
      .and_then(non_negative_u32)
      .filter(|n| *n > 0)
      .ok_or_else(|| invalid("dose number must be a positive integer"))?;

    let administered_on = raw
      .administered_on
      .as_deref()
      .and_then(parse_date)
      .ok_or_else(|| invalid("missing administration date"))?
      .map_err(Error::InvalidDoseRecord)?;

    let total_doses = raw
      .total_doses
      .as_ref()
      .and_then(RawNumber::to_i64)
      .and_then(non_negative_u32)
      .unwrap_or(0);

    Ok(DoseRecord {
      vaccine_id,
      stock_id,
      dose_number,
      administered_on,
      total_doses,
    })
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

pub fn parse_catalog_entry(json: &str) -> Result<VaccineCatalogEntry> {
  let raw: RawCatalogEntry = serde_json::from_str(json)?;
  raw.try_into()
}

pub fn parse_catalog(json: &str) -> Result<Vec<VaccineCatalogEntry>> {
  let raws: Vec<RawCatalogEntry> = serde_json::from_str(json)?;
  raws.into_iter().map(VaccineCatalogEntry::try_from).collect()
}

pub fn parse_history(json: &str) -> Result<Vec<DoseRecord>> {
  let raws: Vec<RawDoseRecord> = serde_json::from_str(json)?;
  raws.into_iter().map(DoseRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn primary_entry_with_string_ids_and_plural_units() {
    let entry = parse_catalog_entry(
      r#"{
        "stock_id": "12", "vac_id": 4, "vac_name": " Pentavalent ",
        "expiry_date": "2027-06-30T00:00:00+08:00",
        "dosing_type": "Primary", "total_doses": 3,
        "intervals": [
          {"dose_number": 3, "interval": 4, "time_unit": "weeks"},
          {"dose_number": 2, "interval": "4", "time_unit": "Week"}
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(entry.stock_id, StockId(12));
    assert_eq!(entry.vaccine_id, VaccineId(4));
    assert_eq!(entry.name, "Pentavalent");
    assert_eq!(entry.expiry_date, NaiveDate::from_ymd_opt(2027, 6, 30));
    assert_eq!(entry.total_doses, 3);
    let Dosing::Primary { intervals } = &entry.dosing else {
      panic!("expected primary dosing");
    };
    let doses: Vec<u32> = intervals.iter().map(|r| r.dose_number).collect();
    assert_eq!(doses, vec![2, 3]);
  }

  #[test]
  fn malformed_interval_rules_are_dropped() {
    let entry = parse_catalog_entry(
      r#"{
        "stock_id": 1, "vaccine_id": 1, "name": "PCV",
        "dosing_type": "primary", "total_doses": 3,
        "intervals": [
          {"dose_number": 2, "interval": 4, "time_unit": "fortnight"},
          {"dose_number": 3, "time_unit": "week"},
          {"dose_number": 3, "interval": -1, "time_unit": "week"}
        ]
      }"#,
    )
    .unwrap();
    assert_eq!(entry.dosing, Dosing::Primary { intervals: vec![] });
  }

  #[test]
  fn routine_rule_is_read_from_flat_fields() {
    let entry = parse_catalog_entry(
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "Flu",
          "dosing_type": "routine", "total_doses": 2,
          "interval": 1, "time_unit": "year"}"#,
    )
    .unwrap();
    assert_eq!(
      entry.dosing,
      Dosing::Routine {
        interval: Some(IntervalRule { interval: 1, time_unit: TimeUnit::Year }),
      }
    );

    let bare = parse_catalog_entry(
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "Flu", "dosing_type": "routine"}"#,
    )
    .unwrap();
    assert_eq!(bare.dosing, Dosing::Routine { interval: None });
    assert_eq!(bare.total_doses, 0);
  }

  #[test]
  fn missing_identity_is_an_error() {
    for json in [
      r#"{"vac_id": 2, "vac_name": "X", "dosing_type": "routine"}"#,
      r#"{"stock_id": 1, "vac_name": "X", "dosing_type": "routine"}"#,
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "", "dosing_type": "routine"}"#,
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "X"}"#,
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "X", "dosing_type": "booster"}"#,
    ] {
      assert!(matches!(
        parse_catalog_entry(json),
        Err(Error::InvalidCatalogEntry(_))
      ));
    }
  }

  #[test]
  fn negative_total_doses_is_an_error() {
    let result = parse_catalog_entry(
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "X",
          "dosing_type": "conditional", "total_doses": -2}"#,
    );
    assert!(matches!(result, Err(Error::InvalidCatalogEntry(_))));
  }

  #[test]
  fn unparseable_expiry_is_an_error_blank_is_absent() {
    let bad = parse_catalog_entry(
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "X",
          "dosing_type": "conditional", "expiry_date": "next june"}"#,
    );
    assert!(matches!(bad, Err(Error::InvalidCatalogEntry(_))));

    let blank = parse_catalog_entry(
      r#"{"stock_id": 1, "vac_id": 2, "vac_name": "X",
          "dosing_type": "conditional", "expiry_date": ""}"#,
    )
    .unwrap();
    assert_eq!(blank.expiry_date, None);
  }

  #[test]
  fn history_accepts_legacy_field_names() {
    let history = parse_history(
      r#"[
        {"vac_id": "4", "stock_id": 12, "dose_no": 1, "date_administered": "2026-08-01"},
        {"vaccine_id": 4, "dose_number": "2", "administered_on": "2026-09-12", "total_doses": 3}
      ]"#,
    )
    .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].dose_number, 1);
    assert_eq!(history[0].stock_id, StockId(12));
    assert_eq!(history[1].stock_id, StockId(0));
    assert_eq!(history[1].total_doses, 3);
    assert_eq!(history[1].administered_on, NaiveDate::from_ymd_opt(2026, 9, 12).unwrap());
  }

  #[test]
  fn history_without_dose_or_date_is_rejected() {
    for json in [
      r#"[{"vac_id": 4, "date": "2026-08-01"}]"#,
      r#"[{"vac_id": 4, "dose_no": 0, "date": "2026-08-01"}]"#,
      r#"[{"vac_id": 4, "dose_no": 1}]"#,
      r#"[{"vac_id": 4, "dose_no": 1, "date": "yesterday"}]"#,
    ] {
      assert!(matches!(parse_history(json), Err(Error::InvalidDoseRecord(_))));
    }
  }

  #[test]
  fn invalid_json_is_a_serialization_error() {
    assert!(matches!(parse_catalog("{not json"), Err(Error::Serialization(_))));
  }
}
