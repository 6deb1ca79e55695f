//! Seasonal model fitting.
//!
//! Responsibilities:
//!
//! - place trend changepoints
//! - solve trend/seasonal coefficients (ridge least squares)
//! - refine them with seeded mini-batch gradient steps

pub mod changepoints;
pub mod fitter;
pub mod refine;

pub use changepoints::*;
pub use fitter::*;
pub use refine::*;
