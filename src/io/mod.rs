//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - forecast CSV export (`export`)
//! - run bundle JSON read/write (`bundle`)

pub mod bundle;
pub mod export;
pub mod ingest;

pub use bundle::*;
pub use export::*;
pub use ingest::*;
