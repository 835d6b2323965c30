//! Conversion sessions: the pipeline controller, its diagnostics, and the job queue.

/// Conversion pipeline controller.
pub mod converter;
/// Timing and memory diagnostics.
pub mod perf;
/// Single-flight conversion queue.
pub mod queue;
