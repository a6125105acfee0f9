//! Fallback platform for operating systems without native support (and for
//! Miri). It allows the engine to compile and run with graceful degradation:
//! threads are not actually pinned and memory placement carries no locality
//! meaning, so the resulting matrix only reflects generic copy throughput.

use std::alloc::{self, Layout};
use std::io;
use std::ptr::NonNull;
use std::thread;

use crate::ProcessorId;
use crate::pal::{Platform, RegionHandle};

const FALLBACK_PAGE_SIZE: usize = 4096;

/// The platform used when the build target has no native implementation.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    fn online_processors(&self) -> io::Result<Vec<ProcessorId>> {
        let count = thread::available_parallelism().map_or(1, usize::from);

        let count = u32::try_from(count).map_err(io::Error::other)?;

        Ok((0..count).collect())
    }

    fn bind_current_thread_to(&self, _processor: ProcessorId) -> io::Result<()> {
        // Pinning is not available; pretend it succeeded so the engine can
        // still produce a (placement-less) matrix.
        Ok(())
    }

    fn reserve(&self, len: usize) -> io::Result<RegionHandle> {
        let layout = region_layout(len)?;

        // SAFETY: layout has non-zero size; lengths are page-rounded upward.
        let addr = unsafe { alloc::alloc_zeroed(layout) };

        let addr = NonNull::new(addr)
            .ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))?;

        Ok(RegionHandle::new(addr, len))
    }

    fn release(&self, region: RegionHandle) {
        let layout = region_layout(region.len())
            .expect("a released region was previously reserved with the same layout");

        // SAFETY: the handle came from reserve() with this exact layout and is
        // released exactly once.
        unsafe { alloc::dealloc(region.addr().as_ptr(), layout) };
    }

    fn page_size(&self) -> usize {
        FALLBACK_PAGE_SIZE
    }
}

fn region_layout(len: usize) -> io::Result<Layout> {
    Layout::from_size_align(len, FALLBACK_PAGE_SIZE).map_err(io::Error::other)
}
