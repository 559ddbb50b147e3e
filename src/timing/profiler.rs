//! Zone-based cycle profiler.
//!
//! A [`Profiler`] owns a map of named zones. [`Profiler::begin_zone`]
//! records the current cycle-counter reading and returns a [`ZoneGuard`];
//! when the guard drops, on any exit path including unwinding, the
//! elapsed delta is added to the zone's accumulated cycles and its hit
//! count is incremented. Re-entering the same name accumulates into the
//! same zone, so loops and recursion aggregate naturally. Nesting is
//! cooperative bookkeeping only: an outer zone's total includes all work
//! done while inner zones were active.
//!
//! The profiler is single-threaded (interior mutability via `RefCell`);
//! sharing one instance across threads requires external synchronization.
//!
//! # Example
//!
//! ```
//! use haversine_harness::timing::Profiler;
//!
//! let profiler = Profiler::new();
//! for _ in 0..3 {
//!     let _zone = profiler.begin_zone("work");
//!     // ... the measured region ...
//! }
//! assert_eq!(profiler.zone_stats("work").unwrap().hit_count, 3);
//! ```

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Instant;

use super::cpu_timer::{estimate_frequency, read_cycle_counter};

/// Accumulated measurements for one named zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneStats {
    /// Total cycles spent between this zone's begin/release pairs.
    pub elapsed_cycles: u64,
    /// Number of begin/release pairs recorded.
    pub hit_count: u64,
}

/// A named-zone cycle profiler with an explicit lifecycle: construct once
/// per run, instrument, read the report once at the end.
pub struct Profiler {
    zones: RefCell<HashMap<&'static str, ZoneStats>>,
    started: Instant,
    // Calibration costs a ~100 ms spin; deferred until the report needs it.
    frequency: OnceCell<u64>,
}

impl Profiler {
    /// Create an empty profiler. The wall clock for the report's total
    /// time starts here.
    pub fn new() -> Self {
        Self {
            zones: RefCell::new(HashMap::new()),
            started: Instant::now(),
            frequency: OnceCell::new(),
        }
    }

    /// Enter the named zone. The returned guard records elapsed cycles and
    /// one hit when it drops.
    ///
    /// Zone names are expected to be literals; the same name always maps
    /// to the same zone for the lifetime of the profiler.
    pub fn begin_zone(&self, name: &'static str) -> ZoneGuard<'_> {
        self.zones.borrow_mut().entry(name).or_default();
        ZoneGuard {
            profiler: self,
            name,
            start_cycles: read_cycle_counter(),
        }
    }

    /// Snapshot of one zone's accumulated stats, if it was ever entered.
    pub fn zone_stats(&self, name: &str) -> Option<ZoneStats> {
        self.zones.borrow().get(name).copied()
    }

    /// Estimated cycle-counter frequency in Hz, calibrating on first use.
    /// 0 means the calibration was degenerate and cycle counts cannot be
    /// converted to time.
    pub fn frequency(&self) -> u64 {
        *self.frequency.get_or_init(estimate_frequency)
    }

    /// Render the performance report.
    ///
    /// Reports total wall time since construction, the estimated counter
    /// frequency, throughput when `total_bytes > 0`, and all zones sorted
    /// by descending accumulated cycles. When calibration was degenerate
    /// the time columns fall back to raw cycle counts.
    pub fn format_report(&self, total_bytes: u64) -> String {
        let total_elapsed = self.started.elapsed().as_secs_f64();
        let frequency = self.frequency();

        let mut out = String::new();
        let _ = writeln!(out, "\n=== PERFORMANCE ANALYSIS ===\n");
        let _ = writeln!(out, "Total Time: {:.3} ms", total_elapsed * 1000.0);
        if frequency > 0 {
            let _ = writeln!(out, "CPU Frequency: ~{} MHz", frequency / 1_000_000);
        } else {
            let _ = writeln!(out, "CPU Frequency: unknown (calibration degenerate)");
        }
        if total_bytes > 0 && total_elapsed > 0.0 {
            let megabytes = total_bytes as f64 / (1024.0 * 1024.0);
            let _ = writeln!(out, "Throughput: {:.2} MB/s", megabytes / total_elapsed);
        }
        let _ = writeln!(out);

        let mut sorted: Vec<(&'static str, ZoneStats)> = self
            .zones
            .borrow()
            .iter()
            .map(|(name, stats)| (*name, *stats))
            .collect();
        sorted.sort_by(|a, b| b.1.elapsed_cycles.cmp(&a.1.elapsed_cycles));
        let total_cycles: u64 = sorted.iter().map(|(_, s)| s.elapsed_cycles).sum();

        let time_header = if frequency > 0 { "Time (ms)" } else { "Cycles" };
        let _ = writeln!(
            out,
            "{:<30} {:>12} {:>8} {:>12} {:>12}",
            "Zone", time_header, "Percent", "Hit Count", "Avg (us)"
        );
        let _ = writeln!(out, "{}", "-".repeat(79));

        for (name, stats) in sorted {
            let percent = if total_cycles > 0 {
                stats.elapsed_cycles as f64 / total_cycles as f64 * 100.0
            } else {
                0.0
            };
            if frequency > 0 {
                let ms = stats.elapsed_cycles as f64 / frequency as f64 * 1000.0;
                let avg_us = if stats.hit_count > 0 {
                    ms * 1000.0 / stats.hit_count as f64
                } else {
                    0.0
                };
                let _ = writeln!(
                    out,
                    "{:<30} {:>12.3} {:>7.2}% {:>12} {:>12.3}",
                    name, ms, percent, stats.hit_count, avg_us
                );
            } else {
                let _ = writeln!(
                    out,
                    "{:<30} {:>12} {:>7.2}% {:>12} {:>12}",
                    name, stats.elapsed_cycles, percent, stats.hit_count, "-"
                );
            }
        }
        let _ = writeln!(out);

        out
    }

    /// Print [`Profiler::format_report`] to stdout.
    pub fn print_results(&self, total_bytes: u64) {
        print!("{}", self.format_report(total_bytes));
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped handle for an active zone entry.
///
/// Dropping the guard, normally or during unwinding, closes the interval
/// and folds it into the zone's totals.
pub struct ZoneGuard<'p> {
    profiler: &'p Profiler,
    name: &'static str,
    start_cycles: u64,
}

impl Drop for ZoneGuard<'_> {
    fn drop(&mut self) {
        let end_cycles = read_cycle_counter();
        let mut zones = self.profiler.zones.borrow_mut();
        let stats = zones.entry(self.name).or_default();
        stats.elapsed_cycles = stats
            .elapsed_cycles
            .saturating_add(end_cycles.saturating_sub(self.start_cycles));
        stats.hit_count += 1;
    }
}
