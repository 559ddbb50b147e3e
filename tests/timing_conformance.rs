//! Timing subsystem tests.
//!
//! Calibration repeatability and the profiler contract: accumulation
//! across re-entries, release on unwinding, and report contents. These
//! assume a reasonably quiescent machine, so the tolerances are loose.

use std::time::Duration;

use haversine_harness::{
    estimate_frequency, parse_and_reduce_coordinates_profiled, read_cycle_counter, Profiler,
};

// ============================================================================
// CpuTimer
// ============================================================================

#[test]
fn cycle_counter_is_monotonic_and_advances() {
    let a = read_cycle_counter();
    std::thread::sleep(Duration::from_millis(2));
    let b = read_cycle_counter();
    assert!(b > a, "counter must advance across a sleep: {} vs {}", a, b);
}

#[test]
fn frequency_estimates_are_repeatable() {
    let first = estimate_frequency();
    let second = estimate_frequency();
    assert!(first > 0, "calibration degenerate on this host");
    assert!(second > 0);

    let relative = (first as f64 - second as f64).abs() / first as f64;
    assert!(
        relative < 0.10,
        "successive estimates differ by {:.1}%: {} vs {}",
        relative * 100.0,
        first,
        second
    );
}

// ============================================================================
// Profiler zones
// ============================================================================

#[test]
fn repeated_zone_entries_accumulate() {
    let profiler = Profiler::new();

    for _ in 0..2 {
        let _zone = profiler.begin_zone("A");
        std::thread::sleep(Duration::from_millis(1));
    }

    let stats = profiler.zone_stats("A").unwrap();
    assert_eq!(stats.hit_count, 2);
    assert!(stats.elapsed_cycles > 0);

    // A third entry keeps growing the same zone.
    let before = stats.elapsed_cycles;
    {
        let _zone = profiler.begin_zone("A");
        std::thread::sleep(Duration::from_millis(1));
    }
    let stats = profiler.zone_stats("A").unwrap();
    assert_eq!(stats.hit_count, 3);
    assert!(stats.elapsed_cycles > before);
}

#[test]
fn nested_zones_outer_includes_inner() {
    let profiler = Profiler::new();
    {
        let _outer = profiler.begin_zone("outer");
        {
            let _inner = profiler.begin_zone("inner");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    let outer = profiler.zone_stats("outer").unwrap();
    let inner = profiler.zone_stats("inner").unwrap();
    assert!(
        outer.elapsed_cycles >= inner.elapsed_cycles,
        "outer zone total must include nested work"
    );
}

#[test]
fn zone_guard_releases_during_unwind() {
    let profiler = Profiler::new();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _zone = profiler.begin_zone("unwound");
        panic!("deliberate");
    }));
    assert!(result.is_err());
    assert_eq!(profiler.zone_stats("unwound").unwrap().hit_count, 1);
}

// ============================================================================
// Report
// ============================================================================

#[test]
fn report_ranks_zones_and_reports_throughput() {
    let input = br#"{"pairs":[{"x0":0,"y0":0,"x1":0,"y1":1}]}"#;
    let profiler = Profiler::new();
    parse_and_reduce_coordinates_profiled(&input[..], &profiler).unwrap();

    let report = profiler.format_report(input.len() as u64);
    assert!(report.contains("=== PERFORMANCE ANALYSIS ==="));
    assert!(report.contains("Total Time:"));
    assert!(report.contains("Throughput:"));
    assert!(report.contains("reduce"));
    assert!(report.contains("haversine"));
    assert!(report.contains("Hit Count"));
}

#[test]
fn report_without_byte_count_has_no_throughput_line() {
    let profiler = Profiler::new();
    {
        let _zone = profiler.begin_zone("only");
    }
    let report = profiler.format_report(0);
    assert!(!report.contains("Throughput:"));
    assert!(report.contains("only"));
}
