//! The authenticated operator a request acts on behalf of.
//!
//! Handlers receive an [`Operator`] explicitly (an axum extension inserted by
//! the server's auth layer) rather than reading it from ambient state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
  pub username: String,
}

impl Operator {
  pub fn new(username: impl Into<String>) -> Self {
    Self { username: username.into() }
  }
}
