//! Frame rasterization and still-image re-encoding.

/// Patch rasterization and still-image encoding.
pub mod patch_encoder;
/// Size-keyed pool of reusable RGBA surfaces.
pub mod surface_pool;
