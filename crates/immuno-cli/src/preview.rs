//! Offline scheduler preview over exported inventory and history JSON.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use immuno_core::{
  boundary::{parse_catalog, parse_catalog_entry, parse_history},
  catalog::{StockId, VaccineCatalogEntry, VaccineSelection, find_stock},
  history::{DoseRecord, records_for_vaccine},
  schedule::{DerivedScheduleState, derive_schedule},
};
use serde::Serialize;

/// A catalog file holds either a single entry or an array of entries.
pub fn load_catalog(json: &str) -> Result<Vec<VaccineCatalogEntry>> {
  if json.trim_start().starts_with('[') {
    parse_catalog(json).context("parsing catalog array")
  } else {
    Ok(vec![parse_catalog_entry(json).context("parsing catalog entry")?])
  }
}

/// Pick the entry to schedule. `stock` is required when the catalog holds
/// more than one entry.
pub fn select_entry(
  catalog: &[VaccineCatalogEntry],
  stock: Option<StockId>,
) -> Result<&VaccineCatalogEntry> {
  match (stock, catalog) {
    (None, [only]) => Ok(only),
    (None, []) => bail!("catalog is empty"),
    (None, _) => bail!("catalog has {} entries; pass --stock", catalog.len()),
    (Some(stock_id), _) => find_stock(catalog, stock_id)
      .with_context(|| format!("stock {stock_id} is not in the catalog")),
  }
}

#[derive(Debug, Serialize)]
pub struct Preview {
  pub selection: VaccineSelection,
  pub reference: NaiveDate,
  #[serde(flatten)]
  pub state:     DerivedScheduleState,
  #[serde(skip)]
  pub warning:   Option<String>,
}

pub fn preview(
  entry: &VaccineCatalogEntry,
  history: &[DoseRecord],
  reference: NaiveDate,
) -> Preview {
  let doses: Vec<&DoseRecord> = records_for_vaccine(history, entry.vaccine_id).collect();
  tracing::debug!(
    vaccine = %entry.name,
    matching = doses.len(),
    total = history.len(),
    "history filtered"
  );
  let state = derive_schedule(entry, doses, reference);
  Preview {
    selection: entry.selection(),
    reference,
    warning: state.completion_warning(entry),
    state,
  }
}

pub fn load_history(json: &str) -> Result<Vec<DoseRecord>> {
  parse_history(json).context("parsing history")
}
