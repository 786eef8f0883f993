//! Error type for `immuno-store-sqlite`.

use immuno_core::{catalog::StockId, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Catalog entries are write-once.
  #[error("stock {0} is already registered")]
  StockExists(StockId),

  /// The dose was refused by the scheduler; nothing was written.
  #[error(transparent)]
  Rejected(#[from] immuno_core::Error),
}

impl StoreError for Error {
  fn rejection(&self) -> Option<&immuno_core::Error> {
    match self {
      Self::Rejected(e) => Some(e),
      _ => None,
    }
  }

  fn is_conflict(&self) -> bool { matches!(self, Self::StockExists(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
