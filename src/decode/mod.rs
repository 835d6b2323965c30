//! Container decoding boundary.

/// Decoder contract and its output types.
pub mod container;
/// GIF implementation of the decoder contract.
pub mod gif_container;
