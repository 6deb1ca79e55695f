//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration enums (`SeasonalityMode`, `Frequency`, `Backend`, `PlotMode`)
//! - the validated series types (`TimeSeries`, `Split`, `Horizon`)
//! - forecast outputs (`ForecastResult`, `ErrorMetrics`)
//! - month arithmetic (`calendar`)

pub mod calendar;
pub mod types;

pub use types::*;
