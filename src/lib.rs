//! `budget-forecast` library crate.
//!
//! The binary is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - forecasting backends plug in behind one trait (`forecast::Forecaster`)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
