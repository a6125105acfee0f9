use std::ptr::NonNull;
use std::{fs, io, mem, ptr};

use crate::ProcessorId;
use crate::pal::{Platform, RegionHandle};

const ONLINE_PROCESSORS_PATH: &str = "/sys/devices/system/cpu/online";

/// The platform that matches the operating system the build is targeting.
///
/// You would only use a different platform in unit tests that need mocks.
/// Even then, whenever possible, tests should use the real platform for
/// maximum realism.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetPlatform;

pub(crate) static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;

// Real OS bindings are excluded from coverage measurement because error paths
// require OS-level failures that are impractical to trigger in tests.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Platform for BuildTargetPlatform {
    fn online_processors(&self) -> io::Result<Vec<ProcessorId>> {
        let contents = fs::read_to_string(ONLINE_PROCESSORS_PATH)?;

        let online = cpulist::parse(contents.trim()).map_err(io::Error::other)?;

        // Restricted environments (containers, taskset) may forbid some online
        // processors to this process; binding to those would always fail, so
        // they are not part of the measurable topology. Enumeration happens
        // before the engine binds anything, so the allowed set is still the
        // inherited one.
        let allowed = current_thread_affinity()?;

        let mut processors: Vec<ProcessorId> = online
            .into_iter()
            .filter(|&processor| {
                // SAFETY: the set was initialized by sched_getaffinity().
                unsafe { libc::CPU_ISSET(processor as usize, &allowed) }
            })
            .collect();

        processors.sort_unstable();

        Ok(processors)
    }

    fn bind_current_thread_to(&self, processor: ProcessorId) -> io::Result<()> {
        // SAFETY: all zeroes is a valid cpu_set_t.
        let mut cpuset: libc::cpu_set_t = unsafe { mem::zeroed() };

        // SAFETY: cpuset is a valid, exclusively owned cpu_set_t.
        unsafe { libc::CPU_SET(processor as usize, &mut cpuset) };

        // 0 means current thread.
        // SAFETY: no requirements beyond passing valid arguments.
        let result = unsafe { libc::sched_setaffinity(0, size_of::<libc::cpu_set_t>(), &cpuset) };

        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn reserve(&self, len: usize) -> io::Result<RegionHandle> {
        // SAFETY: anonymous private mapping with no file descriptor; all
        // arguments are valid for this combination of flags.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        let addr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| io::Error::other("mmap returned a null mapping"))?;

        Ok(RegionHandle::new(addr, len))
    }

    fn release(&self, region: RegionHandle) {
        // SAFETY: the handle came from reserve() with this exact length and is
        // released exactly once.
        let result = unsafe { libc::munmap(region.addr().as_ptr().cast(), region.len()) };

        debug_assert_eq!(result, 0, "munmap of a reserve()-issued region failed");
    }

    fn page_size(&self) -> usize {
        // SAFETY: no requirements.
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

        usize::try_from(page).expect("_SC_PAGESIZE is always positive on Linux")
    }
}

fn current_thread_affinity() -> io::Result<libc::cpu_set_t> {
    // SAFETY: all zeroes is a valid cpu_set_t.
    let mut cpuset: libc::cpu_set_t = unsafe { mem::zeroed() };

    // 0 means current thread.
    // SAFETY: no requirements beyond passing valid arguments.
    let result =
        unsafe { libc::sched_getaffinity(0, size_of::<libc::cpu_set_t>(), &raw mut cpuset) };

    if result == 0 {
        Ok(cpuset)
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_a_power_of_two() {
        let page = BUILD_TARGET_PLATFORM.page_size();

        assert!(page.is_power_of_two());
    }

    #[test]
    fn online_processors_are_nonempty_and_ascending() {
        let processors = BUILD_TARGET_PLATFORM.online_processors().unwrap();

        assert!(!processors.is_empty());
        assert!(processors.is_sorted());
    }

    #[test]
    fn reserved_region_is_writable_and_zeroed() {
        let len = BUILD_TARGET_PLATFORM.page_size();
        let region = BUILD_TARGET_PLATFORM.reserve(len).unwrap();

        let ptr = region.addr().as_ptr();

        // SAFETY: the mapping is len bytes long and exclusively ours.
        let first = unsafe { ptr.read() };
        assert_eq!(first, 0);

        // SAFETY: as above.
        unsafe { ptr.write(0xAB) };
        // SAFETY: as above.
        let written = unsafe { ptr.read() };
        assert_eq!(written, 0xAB);

        BUILD_TARGET_PLATFORM.release(region);
    }

    #[test]
    fn binding_to_an_enumerated_processor_succeeds() {
        let processors = BUILD_TARGET_PLATFORM.online_processors().unwrap();
        let first = *processors.first().unwrap();

        BUILD_TARGET_PLATFORM.bind_current_thread_to(first).unwrap();
    }
}
