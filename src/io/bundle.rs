//! Read/write run bundle JSON files.
//!
//! A bundle is the portable record of one forecast run: the train/test split,
//! every predicted point, and the hold-out metrics. `budget-forecast plot`
//! re-renders a chart from it without refitting.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::RunOutput;
use crate::error::AppError;

const TOOL: &str = "budget-forecast";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunBundle {
    pub tool: String,
    /// Input file the run was loaded from, as given on the command line.
    pub input: String,
    pub run: RunOutput,
}

impl RunBundle {
    pub fn new(input: &Path, run: RunOutput) -> Self {
        Self {
            tool: TOOL.to_string(),
            input: input.display().to_string(),
            run,
        }
    }
}

/// Write a run bundle as pretty-printed JSON.
pub fn write_run_json(path: &Path, bundle: &RunBundle) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create run JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, bundle)
        .map_err(|e| AppError::config(format!("Failed to write run JSON: {e}")))?;
    info!(path = %path.display(), "wrote run bundle");
    Ok(())
}

/// Read a run bundle written by [`write_run_json`].
pub fn read_run_json(path: &Path) -> Result<RunBundle, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::data(format!("Failed to open run JSON '{}': {e}", path.display())))?;
    let bundle: RunBundle = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::data(format!("Invalid run JSON: {e}")))?;
    if bundle.run.forecast.is_empty() {
        return Err(AppError::data("Run JSON contains no forecast points."));
    }
    Ok(bundle)
}
