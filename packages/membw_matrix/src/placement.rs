use std::io;
use std::thread;

use crate::pal::{Platform, PlatformFacade};
use crate::region::MappedRegion;
use crate::{Core, Error, Result};

/// Restricts the calling thread to run only on `core`.
///
/// Must precede any allocation or sampling whose placement or measurement
/// depends on current-core identity. The caller decides how fatal a failure
/// is; in this engine every bind failure ends the run.
pub(crate) fn bind_current_thread(platform: &PlatformFacade, core: Core) -> io::Result<()> {
    platform.bind_current_thread_to(core.processor_id())
}

/// What came out of a placement attempt for one producer core.
#[derive(Debug)]
pub(crate) enum PlacementOutcome {
    /// The region was reserved and first-touched near the producer core.
    Placed(MappedRegion),

    /// The memory reservation itself failed. The cell is skipped; the run
    /// continues.
    ReservationFailed(io::Error),
}

/// Reserves `size` bytes of memory physically placed near `core`.
///
/// A dedicated thread binds itself to the producer core, reserves the region
/// and writes every one of the first `size` bytes, so that first-touch page
/// placement biases the physical backing toward memory local to that core.
/// The thread is joined before this function returns, which keeps the
/// caller's own affinity (the consumer core) untouched and makes placement a
/// synchronous, transactional step.
///
/// # Errors
///
/// A bind failure inside the placement thread is fatal and surfaces as
/// [`Error::PlacementBindFailed`]; a measurement with unknown placement is
/// worse than no measurement.
pub(crate) fn place_near(
    platform: &PlatformFacade,
    core: Core,
    size: usize,
) -> Result<PlacementOutcome> {
    let thread_platform = platform.clone();

    let handle = thread::spawn(move || place_on_current_thread(&thread_platform, core, size));

    match handle.join() {
        Ok(outcome) => outcome,
        Err(_panic) => Err(Error::PlacementThreadPanicked),
    }
}

fn place_on_current_thread(
    platform: &PlatformFacade,
    core: Core,
    size: usize,
) -> Result<PlacementOutcome> {
    bind_current_thread(platform, core).map_err(|source| Error::PlacementBindFailed {
        processor: core.processor_id(),
        source,
    })?;

    let mut region = match MappedRegion::reserve(platform, size) {
        Ok(region) => region,
        Err(error) => return Ok(PlacementOutcome::ReservationFailed(error)),
    };

    first_touch(&mut region);

    Ok(PlacementOutcome::Placed(region))
}

/// Sequential byte-by-byte write over the first `size` bytes to force physical
/// backing of the pages while the thread is bound to the producer core.
fn first_touch(region: &mut MappedRegion) {
    let len = region.requested_len();
    let ptr = region.as_mut_ptr();

    for offset in 0..len {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "deliberately truncated to a repeating byte pattern"
        )]
        let value = (offset % 256) as u8;

        // SAFETY: offset is within the mapping and the region is exclusively
        // owned by this thread until it is handed back.
        unsafe { ptr.add(offset).write(value) };
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::pal::MockPlatform;
    use crate::pal::testing::leaked_region;

    const PAGE: usize = 4096;

    fn core7() -> Core {
        Core::new(0, 7)
    }

    #[test]
    fn placement_binds_to_producer_then_touches_every_byte() {
        let mut platform = MockPlatform::new();
        platform
            .expect_bind_current_thread_to()
            .with(eq(7))
            .times(1)
            .returning(|_| Ok(()));
        platform.expect_page_size().return_const(PAGE);
        platform
            .expect_reserve()
            .returning(|len| Ok(leaked_region(len)));
        platform.expect_release().return_const(());

        let facade = PlatformFacade::from_mock(platform);

        let outcome = place_near(&facade, core7(), 600).unwrap();

        let region = match outcome {
            PlacementOutcome::Placed(region) => region,
            PlacementOutcome::ReservationFailed(error) => {
                panic!("reservation unexpectedly failed: {error}")
            }
        };

        for offset in 0..region.requested_len() {
            // SAFETY: offset is within the mapping owned by region.
            let value = unsafe { region.as_ptr().add(offset).read() };
            assert_eq!(usize::from(value), offset % 256);
        }
    }

    #[test]
    fn reservation_failure_is_recoverable() {
        let mut platform = MockPlatform::new();
        platform
            .expect_bind_current_thread_to()
            .returning(|_| Ok(()));
        platform.expect_page_size().return_const(PAGE);
        platform
            .expect_reserve()
            .returning(|_| Err(std::io::Error::from(std::io::ErrorKind::OutOfMemory)));

        let facade = PlatformFacade::from_mock(platform);

        let outcome = place_near(&facade, core7(), PAGE).unwrap();

        assert!(matches!(outcome, PlacementOutcome::ReservationFailed(_)));
    }

    #[test]
    fn bind_failure_is_fatal() {
        let mut platform = MockPlatform::new();
        platform
            .expect_bind_current_thread_to()
            .returning(|_| Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied)));

        let facade = PlatformFacade::from_mock(platform);

        let result = place_near(&facade, core7(), PAGE);

        assert!(matches!(
            result,
            Err(Error::PlacementBindFailed { processor: 7, .. })
        ));
    }
}
