//! Optional heap accounting for conversion diagnostics.
//!
//! With the `alloc-track` feature the process allocator is instrumented and [`AllocRegion`]
//! reports what happened since it was opened. Without the feature, regions report nothing.

/// Heap activity observed over one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MemorySample {
    /// Number of allocations.
    pub allocations: usize,
    /// Number of deallocations.
    pub deallocations: usize,
    /// Bytes allocated.
    pub bytes_allocated: usize,
    /// Bytes freed.
    pub bytes_deallocated: usize,
}

impl MemorySample {
    /// Bytes still held at the end of the region (may be negative if earlier memory was freed).
    pub fn net_bytes(&self) -> i64 {
        self.bytes_allocated as i64 - self.bytes_deallocated as i64
    }
}

#[cfg(feature = "alloc-track")]
mod imp {
    use super::MemorySample;
    use stats_alloc::{INSTRUMENTED_SYSTEM, Region, StatsAlloc};
    use std::alloc::System;

    #[global_allocator]
    static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

    impl From<stats_alloc::Stats> for MemorySample {
        fn from(s: stats_alloc::Stats) -> Self {
            Self {
                allocations: s.allocations,
                deallocations: s.deallocations,
                bytes_allocated: s.bytes_allocated,
                bytes_deallocated: s.bytes_deallocated,
            }
        }
    }

    pub(crate) struct AllocRegion {
        region: Region<'static, System>,
    }

    impl AllocRegion {
        pub(crate) fn new() -> Self {
            Self {
                region: Region::new(GLOBAL),
            }
        }

        pub(crate) fn sample(&self) -> Option<MemorySample> {
            Some(self.region.change().into())
        }
    }
}

#[cfg(not(feature = "alloc-track"))]
mod imp {
    use super::MemorySample;

    pub(crate) struct AllocRegion;

    impl AllocRegion {
        pub(crate) fn new() -> Self {
            Self
        }

        pub(crate) fn sample(&self) -> Option<MemorySample> {
            None
        }
    }
}

pub(crate) use imp::AllocRegion;
