//! Forecast model implementations.
//!
//! Models are small, pure structures plus design-row helpers so that the
//! fitting code can stay generic.

pub mod holt_winters;
pub mod model;

pub use holt_winters::*;
pub use model::*;
