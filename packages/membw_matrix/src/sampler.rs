use std::fmt::Debug;
use std::num::NonZero;
use std::ptr;
use std::time::{Duration, Instant};

use crate::pal::PlatformFacade;
use crate::region::MappedRegion;

/// One timed bulk copy within an averaging run.
///
/// This is a seam: production code uses [`WallClockCopy`], tests substitute a
/// copier with synthetic pass durations to make the bandwidth arithmetic
/// checkable.
pub(crate) trait CopyPass: Debug {
    /// Copies `len` bytes from `src` to `dst` and returns the elapsed
    /// wall-clock time of the copy alone.
    ///
    /// # Safety
    ///
    /// `src` and `dst` must each be valid for `len` bytes and must not
    /// overlap.
    unsafe fn timed_copy(&self, src: *const u8, dst: *mut u8, len: usize) -> Duration;
}

/// The real copier: a single bulk `memcpy` bracketed by wall-clock
/// timestamps.
#[derive(Debug, Default)]
pub(crate) struct WallClockCopy;

impl CopyPass for WallClockCopy {
    unsafe fn timed_copy(&self, src: *const u8, dst: *mut u8, len: usize) -> Duration {
        let start = Instant::now();

        // SAFETY: the caller guarantees both pointers are valid for len bytes
        // and do not overlap.
        unsafe { ptr::copy_nonoverlapping(src, dst, len) };

        start.elapsed()
    }
}

/// Estimates read bandwidth of a memory region by repeated timed copies into a
/// local scratch buffer.
///
/// The pass count is explicit configuration threaded in at construction; there
/// is no process-wide state.
#[derive(Debug)]
pub(crate) struct Sampler {
    platform: PlatformFacade,
    passes: NonZero<u32>,
}

impl Sampler {
    pub(crate) fn new(platform: PlatformFacade, passes: NonZero<u32>) -> Self {
        Self { platform, passes }
    }

    /// Measures read bandwidth of `source` in bytes per second using `copy`
    /// for the timed passes.
    ///
    /// Returns `0.0` if the local scratch buffer cannot be reserved; this is
    /// the one recoverable failure path in the sampler and it never aborts the
    /// run.
    pub(crate) fn measure_with(&self, source: &MappedRegion, copy: &dyn CopyPass) -> f64 {
        let size = source.requested_len();

        // The scratch buffer is a plain page-rounded mapping, not core-pinned:
        // it lives wherever the consumer core's first touch puts it, which is
        // exactly what a local reader would see.
        let mut scratch = match MappedRegion::reserve(&self.platform, size) {
            Ok(region) => region,
            Err(error) => {
                eprintln!("scratch buffer reservation failed, reporting zero bandwidth: {error}");
                return 0.0;
            }
        };

        let mut total = Duration::ZERO;

        for _ in 0..self.passes.get() {
            // Overwrite the destination so no cache residency survives from
            // the previous pass; every copy pays the full cost of moving
            // `size` bytes.
            // SAFETY: scratch is exclusively owned and at least size bytes.
            unsafe { ptr::write_bytes(scratch.as_mut_ptr(), 0, size) };

            // SAFETY: source and scratch are distinct mappings, both valid
            // for size bytes.
            let elapsed = unsafe { copy.timed_copy(source.as_ptr(), scratch.as_mut_ptr(), size) };

            total = total
                .checked_add(elapsed)
                .expect("sum of pass durations cannot overflow the Duration range");
        }

        // Total bytes moved over total elapsed time, not a mean of per-pass
        // bandwidths. The two differ when pass durations vary; this form is
        // stable against single-pass jitter.
        #[expect(
            clippy::cast_precision_loss,
            reason = "transfer sizes are far below 2^52 bytes"
        )]
        let moved = size as f64 * f64::from(self.passes.get());

        moved / total.as_secs_f64()
    }
}

#[cfg(test)]
pub(crate) use test_copiers::FixedDurationCopy;

#[cfg(test)]
mod test_copiers {
    use super::*;

    /// A synthetic copier that performs no copy and reports a fixed duration
    /// for every pass.
    #[derive(Debug)]
    pub(crate) struct FixedDurationCopy {
        pub(crate) pass: Duration,
    }

    impl CopyPass for FixedDurationCopy {
        unsafe fn timed_copy(&self, _src: *const u8, _dst: *mut u8, _len: usize) -> Duration {
            self.pass
        }
    }
}
