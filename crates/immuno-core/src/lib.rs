//! Core types and the dose scheduler for the immunization records service.
//!
//! This crate is free of HTTP and database dependencies. Every other crate in
//! the workspace depends on it.

// Store backends implement the trait with native `async fn`.
#![allow(async_fn_in_trait)]

pub mod boundary;
pub mod catalog;
pub mod error;
pub mod history;
pub mod interval;
pub mod schedule;
pub mod session;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
