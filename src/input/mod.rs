//! Conversion inputs and the precondition checks run on them.

/// Input representation and validation.
pub mod validate;
