//! Error types for `immuno-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::StockId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid catalog entry: {0}")]
  InvalidCatalogEntry(String),

  #[error("invalid dose record: {0}")]
  InvalidDoseRecord(String),

  #[error("{vaccine} regimen already completed (dose {dose}/{total})")]
  RegimenComplete {
    vaccine: String,
    dose:    u32,
    total:   u32,
  },

  #[error("stock {stock_id} of {vaccine} expired on {expired_on}")]
  StockExpired {
    stock_id:   StockId,
    vaccine:    String,
    expired_on: NaiveDate,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
