//! Vaccine catalog entries: the immutable reference data describing a stock
//! (lot) of a vaccine and the regimen it follows.
//!
//! Catalog data is owned by the inventory subsystem. The records service only
//! reads it; a stock entry never changes once registered.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Identifies one lot of a vaccine product in inventory.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StockId(pub i64);

/// Identifies the abstract vaccine (e.g. "BCG"), shared by all of its lots.
/// Dose history is grouped by this id, not by [`StockId`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VaccineId(pub i64);

impl fmt::Display for StockId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for VaccineId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Intervals ───────────────────────────────────────────────────────────────

/// The calendar unit an interval is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
  Day,
  Week,
  Month,
  Year,
}

/// Returned by [`TimeUnit::from_str`] for an unrecognised unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTimeUnit(pub String);

impl FromStr for TimeUnit {
  type Err = UnknownTimeUnit;

  /// Accepts singular and plural spellings in any case: `"week"`, `"Weeks"`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    let singular = lower.strip_suffix('s').unwrap_or(&lower);
    match singular {
      "day" => Ok(Self::Day),
      "week" => Ok(Self::Week),
      "month" => Ok(Self::Month),
      "year" => Ok(Self::Year),
      _ => Err(UnknownTimeUnit(s.to_owned())),
    }
  }
}

/// A single repeating interval, used by routine vaccines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRule {
  pub interval:  u32,
  pub time_unit: TimeUnit,
}

/// The wait before a specific dose of a primary series.
///
/// `dose_number` is the dose being scheduled: the rule with `dose_number = 2`
/// gives the gap between dose 1 and dose 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseInterval {
  pub dose_number: u32,
  pub interval:    u32,
  pub time_unit:   TimeUnit,
}

// ─── Dosing ──────────────────────────────────────────────────────────────────

/// The regimen shape without its interval data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DosingType {
  /// No dose accumulation across visits (e.g. seasonal shots).
  Routine,
  /// Fixed multi-dose series with per-dose intervals.
  Primary,
  /// Variable-length series; the operator supplies the follow-up.
  Conditional,
}

impl DosingType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Routine => "routine",
      Self::Primary => "primary",
      Self::Conditional => "conditional",
    }
  }
}

impl fmt::Display for DosingType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DosingType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "routine" => Ok(Self::Routine),
      "primary" => Ok(Self::Primary),
      "conditional" => Ok(Self::Conditional),
      other => Err(format!("unknown dosing type: {other:?}")),
    }
  }
}

/// The regimen together with the interval data that only makes sense for it.
/// A missing rule is a valid state and means "no scheduled follow-up".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dosing_type", rename_all = "snake_case")]
pub enum Dosing {
  Routine {
    interval: Option<IntervalRule>,
  },
  Primary {
    /// Ordered by `dose_number`; gaps are allowed.
    intervals: Vec<DoseInterval>,
  },
  Conditional,
}

impl Dosing {
  pub fn kind(&self) -> DosingType {
    match self {
      Self::Routine { .. } => DosingType::Routine,
      Self::Primary { .. } => DosingType::Primary,
      Self::Conditional => DosingType::Conditional,
    }
  }

  pub fn is_routine(&self) -> bool { matches!(self, Self::Routine { .. }) }
}

// ─── Catalog entry ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineCatalogEntry {
  pub stock_id:    StockId,
  pub vaccine_id:  VaccineId,
  pub name:        String,
  pub expiry_date: Option<NaiveDate>,
  /// Doses in the full regimen. Zero means the regimen is never considered
  /// complete.
  pub total_doses: u32,
  pub dosing:      Dosing,
}

impl VaccineCatalogEntry {
  /// The primary-series rule for `dose_number`, if the catalog defines one.
  pub fn interval_for_dose(&self, dose_number: u32) -> Option<&DoseInterval> {
    match &self.dosing {
      Dosing::Primary { intervals } => {
        intervals.iter().find(|rule| rule.dose_number == dose_number)
      }
      _ => None,
    }
  }

  /// `true` if the lot's expiry date lies strictly before `date`.
  pub fn is_expired_on(&self, date: NaiveDate) -> bool {
    self.expiry_date.is_some_and(|expiry| expiry < date)
  }

  pub fn selection(&self) -> VaccineSelection {
    VaccineSelection {
      stock_id:     self.stock_id,
      vaccine_id:   self.vaccine_id,
      vaccine_name: self.name.clone(),
      expiry_date:  self.expiry_date,
    }
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// What an operator picks from the vaccine combo-box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineSelection {
  pub stock_id:     StockId,
  pub vaccine_id:   VaccineId,
  pub vaccine_name: String,
  pub expiry_date:  Option<NaiveDate>,
}

/// The catalog entry for `stock_id`, if present.
pub fn find_stock(
  catalog: &[VaccineCatalogEntry],
  stock_id: StockId,
) -> Option<&VaccineCatalogEntry> {
  catalog.iter().find(|entry| entry.stock_id == stock_id)
}
