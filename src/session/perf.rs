use crate::foundation::alloc_track::{AllocRegion, MemorySample};
use std::time::{Duration, Instant};

/// Diagnostics for one finished conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerfSummary {
    /// Wall-clock time from [`PerfMonitor::start`] to [`PerfMonitor::finish`].
    pub total: Duration,
    /// Mean per-frame encode time (zero when no frames were timed).
    pub avg_frame: Duration,
    /// Slowest single frame encode.
    pub slowest_frame: Duration,
    /// Number of frames timed.
    pub frames_timed: usize,
    /// Input size in bytes.
    pub file_size: u64,
    /// Frame count reported by the caller.
    pub frame_count: usize,
    /// Canvas dimensions.
    pub dimensions: (u32, u32),
    /// Heap activity, when the `alloc-track` feature is enabled.
    pub memory: Option<MemorySample>,
    /// Average frame time exceeded the configured threshold.
    pub pathological: bool,
}

/// Wall-clock and per-frame timing capture.
///
/// Purely observational: nothing here can fail a conversion.
pub struct PerfMonitor {
    slow_frame_threshold: Duration,
    started: Option<Instant>,
    frame_times: Vec<Duration>,
    alloc: Option<AllocRegion>,
}

impl PerfMonitor {
    /// Create a monitor flagging conversions whose average frame exceeds `slow_frame_threshold`.
    pub fn new(slow_frame_threshold: Duration) -> Self {
        Self {
            slow_frame_threshold,
            started: None,
            frame_times: Vec::new(),
            alloc: None,
        }
    }

    /// Reset and start timing.
    pub fn start(&mut self) {
        self.frame_times.clear();
        self.alloc = Some(AllocRegion::new());
        self.started = Some(Instant::now());
    }

    /// Record one frame's encode duration.
    pub fn record_frame(&mut self, elapsed: Duration) {
        self.frame_times.push(elapsed);
    }

    /// Frames recorded since the last [`PerfMonitor::start`].
    pub fn frames_recorded(&self) -> usize {
        self.frame_times.len()
    }

    /// Summarize everything recorded since [`PerfMonitor::start`].
    pub fn finish(
        &mut self,
        file_size: u64,
        frame_count: usize,
        dimensions: (u32, u32),
    ) -> PerfSummary {
        let total = self.started.take().map(|t| t.elapsed()).unwrap_or_default();
        let frames_timed = self.frame_times.len();
        let sum: Duration = self.frame_times.iter().sum();
        let avg_frame = if frames_timed == 0 {
            Duration::ZERO
        } else {
            sum / frames_timed as u32
        };
        let slowest_frame = self.frame_times.iter().max().copied().unwrap_or_default();
        let memory = self.alloc.take().and_then(|r| r.sample());

        PerfSummary {
            total,
            avg_frame,
            slowest_frame,
            frames_timed,
            file_size,
            frame_count,
            dimensions,
            memory,
            pathological: frames_timed > 0 && avg_frame > self.slow_frame_threshold,
        }
    }
}

impl PerfSummary {
    /// Emit the summary through `tracing`; pathological inputs log at `warn`.
    pub fn log(&self) {
        let (w, h) = self.dimensions;
        let net_bytes = self.memory.map(|m| m.net_bytes());
        if self.pathological {
            tracing::warn!(
                total_ms = self.total.as_millis() as u64,
                avg_frame_us = self.avg_frame.as_micros() as u64,
                slowest_frame_us = self.slowest_frame.as_micros() as u64,
                frames = self.frame_count,
                file_size = self.file_size,
                width = w,
                height = h,
                ?net_bytes,
                "conversion is unusually slow per frame"
            );
        } else {
            tracing::info!(
                total_ms = self.total.as_millis() as u64,
                avg_frame_us = self.avg_frame.as_micros() as u64,
                frames = self.frame_count,
                file_size = self.file_size,
                width = w,
                height = h,
                ?net_bytes,
                "conversion finished"
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/perf.rs"]
mod tests;
