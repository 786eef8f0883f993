//! Handlers for `/stock` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stock` | All registered catalog entries |
//! | `POST` | `/stock` | Body: inventory JSON ([`RawCatalogEntry`]); 201, 409 if the stock id is registered |
//! | `GET`  | `/stock/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use immuno_core::{
  boundary::RawCatalogEntry,
  catalog::{StockId, VaccineCatalogEntry},
  store::ImmunizationStore,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /stock`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<VaccineCatalogEntry>>, ApiError>
where
  S: ImmunizationStore,
{
  let entries = store.list_stock().await.map_err(ApiError::store)?;
  Ok(Json(entries))
}

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /stock`: the body is parsed leniently, then validated into a typed
/// entry before it is stored.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<RawCatalogEntry>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ImmunizationStore,
{
  let entry = VaccineCatalogEntry::try_from(body)?;
  let entry = store.register_stock(entry).await.map_err(ApiError::store)?;
  tracing::info!(
    stock_id = %entry.stock_id,
    vaccine = %entry.name,
    dosing = %entry.dosing.kind(),
    "stock registered"
  );
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /stock/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<StockId>,
) -> Result<Json<VaccineCatalogEntry>, ApiError>
where
  S: ImmunizationStore,
{
  let entry = store
    .get_stock(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("stock {id} not found")))?;
  Ok(Json(entry))
}
