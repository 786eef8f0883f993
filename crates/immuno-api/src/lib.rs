//! JSON REST API for immunization records.
//!
//! Exposes an axum [`Router`] backed by any
//! [`immuno_core::store::ImmunizationStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility; the one thing the caller must provide is
//! an [`Operator`](immuno_core::session::Operator) request extension for the
//! write endpoints.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", immuno_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod schedule;
pub mod stock;
pub mod vaccinations;

use std::sync::Arc;

use axum::{Router, routing::get};
use immuno_core::store::ImmunizationStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ImmunizationStore + 'static,
{
  Router::new()
    // Catalog
    .route("/stock", get(stock::list::<S>).post(stock::create::<S>))
    .route("/stock/{id}", get(stock::get_one::<S>))
    // Patients
    .route(
      "/patients/{id}/vaccinations",
      get(vaccinations::list::<S>).post(vaccinations::create::<S>),
    )
    .route("/patients/{id}/schedule", get(schedule::handler::<S>))
    // Records
    .route("/vaccinations/{id}", get(vaccinations::get_one::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
