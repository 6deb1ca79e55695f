//! Series preparation: the chronological splitter and a synthetic generator.

pub mod sample;
pub mod split;

pub use sample::{generate_sample, write_series_csv};
pub use split::{split_index, split_series};
