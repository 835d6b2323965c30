//! The animation document and its exporters.

/// JSON and per-frame archive export.
pub mod export;
/// Document data model.
pub mod model;
