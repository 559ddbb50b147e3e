//! Hardware cycle counter access and frequency calibration.
//!
//! [`read_cycle_counter`] compiles to a single serialized counter read:
//! `lfence; rdtsc` on x86_64, `isb; mrs cntvct_el0` on aarch64, and a
//! monotonic-nanosecond fallback elsewhere. No allocation, no syscall.
//!
//! [`estimate_frequency`] races the counter against the OS monotonic clock
//! over a fixed wall-clock window. Each endpoint sample brackets the counter
//! read between two `Instant` reads and is discarded if the bracket is wider
//! than the skew threshold; a wide bracket means the thread was preempted
//! mid-sample. The calling thread's scheduling priority is raised for the
//! duration of the window and restored when the guard drops, on every exit
//! path.

use std::time::{Duration, Instant};

use thread_priority::{
    get_current_thread_priority, set_current_thread_priority, ThreadPriority,
};

/// Wall-clock window the calibration spins for.
const CALIBRATION_WAIT: Duration = Duration::from_millis(100);

/// Maximum tolerated width of the `Instant` bracket around one counter read.
/// Samples wider than this were perturbed by the scheduler and are retried.
const MAX_SAMPLE_SKEW: Duration = Duration::from_micros(100);

/// Read the CPU cycle counter.
#[inline]
pub fn read_cycle_counter() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        read_tsc_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        read_cntvct_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        read_monotonic_fallback()
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn read_tsc_x86_64() -> u64 {
    use std::sync::atomic::{compiler_fence, Ordering};

    compiler_fence(Ordering::SeqCst);
    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }
    compiler_fence(Ordering::SeqCst);
    cycles
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn read_cntvct_aarch64() -> u64 {
    use std::sync::atomic::{compiler_fence, Ordering};

    compiler_fence(Ordering::SeqCst);
    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }
    compiler_fence(Ordering::SeqCst);
    cycles
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn read_monotonic_fallback() -> u64 {
    use std::sync::OnceLock;
    static START: OnceLock<Instant> = OnceLock::new();

    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// Estimate the cycle counter frequency in Hz.
///
/// Returns 0 when the monotonic clock produced no measurable delta across
/// the calibration window; callers must treat 0 as "unknown frequency",
/// never as a divisor.
pub fn estimate_frequency() -> u64 {
    let _priority = PriorityGuard::elevate();

    let (start_cycles, start_instant) = skew_checked_sample();
    while start_instant.elapsed() < CALIBRATION_WAIT {
        std::hint::spin_loop();
    }
    let (end_cycles, end_instant) = skew_checked_sample();

    let elapsed_nanos = end_instant.duration_since(start_instant).as_nanos();
    if elapsed_nanos == 0 {
        tracing::debug!("calibration window produced no wall-clock delta");
        return 0;
    }

    let elapsed_cycles = end_cycles.saturating_sub(start_cycles);
    let frequency = (u128::from(elapsed_cycles) * 1_000_000_000 / elapsed_nanos) as u64;
    tracing::debug!(frequency_hz = frequency, "cycle counter calibrated");
    frequency
}

/// Take one (cycle counter, wall clock) sample, retrying until the counter
/// read sits inside a tight `Instant` bracket. The returned instant is the
/// bracket midpoint.
fn skew_checked_sample() -> (u64, Instant) {
    loop {
        let before = Instant::now();
        let cycles = read_cycle_counter();
        let after = Instant::now();

        let bracket = after.duration_since(before);
        if bracket <= MAX_SAMPLE_SKEW {
            return (cycles, before + bracket / 2);
        }
    }
}

/// Restores the thread's original scheduling priority on drop.
///
/// Elevation is best effort: without privileges the raise fails and the
/// guard is a no-op, but calibration still proceeds at normal priority.
struct PriorityGuard {
    original: Option<ThreadPriority>,
}

impl PriorityGuard {
    fn elevate() -> Self {
        let original = match get_current_thread_priority() {
            Ok(priority) => priority,
            Err(err) => {
                tracing::debug!(?err, "could not query thread priority");
                return Self { original: None };
            }
        };

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(()) => Self {
                original: Some(original),
            },
            Err(err) => {
                tracing::debug!(?err, "thread priority elevation unavailable");
                Self { original: None }
            }
        }
    }
}

impl Drop for PriorityGuard {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(err) = set_current_thread_priority(original) {
                tracing::warn!(?err, "failed to restore thread priority");
            }
        }
    }
}
