use image::RgbaImage;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SurfaceKey {
    w: u32,
    h: u32,
}

impl SurfaceKey {
    fn byte_len(self) -> usize {
        (self.w as usize)
            .saturating_mul(self.h as usize)
            .saturating_mul(4)
    }
}

/// Counters describing how the pool has been used.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RasterPoolStats {
    /// Calls to [`RasterPool::acquire`].
    pub acquisitions: u64,
    /// Acquisitions served by an already tracked surface.
    pub reused: u64,
    /// Surfaces allocated and registered in the pool.
    pub alloc_surfaces: u64,
    /// Bytes allocated for registered surfaces.
    pub alloc_bytes: u64,
    /// Throwaway surfaces handed out because the pool was full.
    pub scratch_surfaces: u64,
    /// Calls to [`RasterPool::release_all`].
    pub releases: u64,
    /// Distinct sizes currently tracked.
    pub tracked_sizes: usize,
    /// Bytes currently held by tracked surfaces.
    pub tracked_bytes: usize,
}

/// A surface lent out by [`RasterPool::acquire`].
///
/// Pooled leases borrow the pool mutably, so a surface can never be referenced once the next
/// acquisition happens. Scratch leases own their surface and drop it with the lease.
#[derive(Debug)]
pub enum SurfaceLease<'a> {
    /// Surface tracked by the pool, reused across acquisitions of the same size.
    Pooled(&'a mut RgbaImage),
    /// Untracked surface, allocated for this acquisition only.
    Scratch(RgbaImage),
}

impl SurfaceLease<'_> {
    /// Return `true` when the surface is tracked by the pool.
    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooled(_))
    }
}

impl Deref for SurfaceLease<'_> {
    type Target = RgbaImage;

    fn deref(&self) -> &RgbaImage {
        match self {
            Self::Pooled(s) => s,
            Self::Scratch(s) => s,
        }
    }
}

impl DerefMut for SurfaceLease<'_> {
    fn deref_mut(&mut self) -> &mut RgbaImage {
        match self {
            Self::Pooled(s) => s,
            Self::Scratch(s) => s,
        }
    }
}

/// Fixed-capacity, size-keyed cache of RGBA surfaces.
///
/// At most one surface is kept per `(width, height)` and at most `max_sizes` sizes are tracked.
/// There is no LRU ordering: once full, new sizes get throwaway surfaces. Animation frames almost
/// always reuse one or two sizes (the canvas, and occasionally a partial patch), so this stays hot.
///
/// The pool is owned by a single converter and is never shared between threads.
#[derive(Debug)]
pub struct RasterPool {
    max_sizes: usize,
    stats: RasterPoolStats,
    surfaces: HashMap<SurfaceKey, RgbaImage>,
}

impl RasterPool {
    /// Default number of distinct sizes tracked.
    pub const DEFAULT_MAX_SIZES: usize = 5;

    /// Create a pool tracking up to `max_sizes` distinct sizes (`0` disables pooling).
    pub fn new(max_sizes: usize) -> Self {
        Self {
            max_sizes,
            stats: RasterPoolStats::default(),
            surfaces: HashMap::new(),
        }
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> RasterPoolStats {
        let mut stats = self.stats.clone();
        stats.tracked_sizes = self.surfaces.len();
        stats.tracked_bytes = self.surfaces.keys().map(|k| k.byte_len()).sum();
        stats
    }

    /// Lend a fully transparent `width x height` surface.
    pub fn acquire(&mut self, width: u32, height: u32) -> SurfaceLease<'_> {
        self.stats.acquisitions = self.stats.acquisitions.saturating_add(1);
        let key = SurfaceKey {
            w: width,
            h: height,
        };
        let tracked = self.surfaces.len();

        match self.surfaces.entry(key) {
            Entry::Occupied(e) => {
                self.stats.reused = self.stats.reused.saturating_add(1);
                let surface = e.into_mut();
                let px: &mut [u8] = surface;
                px.fill(0);
                SurfaceLease::Pooled(surface)
            }
            Entry::Vacant(e) if tracked < self.max_sizes => {
                self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
                self.stats.alloc_bytes =
                    self.stats.alloc_bytes.saturating_add(key.byte_len() as u64);
                SurfaceLease::Pooled(e.insert(RgbaImage::new(width, height)))
            }
            Entry::Vacant(_) => {
                self.stats.scratch_surfaces = self.stats.scratch_surfaces.saturating_add(1);
                SurfaceLease::Scratch(RgbaImage::new(width, height))
            }
        }
    }

    /// Drop every tracked surface.
    pub fn release_all(&mut self) {
        self.stats.releases = self.stats.releases.saturating_add(1);
        self.surfaces = HashMap::new();
    }
}

impl Default for RasterPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SIZES)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface_pool.rs"]
mod tests;
