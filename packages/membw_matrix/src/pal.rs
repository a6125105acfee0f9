//! Platform Abstraction Layer (PAL). All operating system calls the engine
//! makes go through this layer, enabling them to be mocked in tests.

mod abstractions;
pub(crate) use abstractions::*;

mod facade;
pub(crate) use facade::*;

#[cfg(all(target_os = "linux", not(miri)))]
mod linux;
#[cfg(all(target_os = "linux", not(miri)))]
pub(crate) use linux::*;

#[cfg(any(miri, not(target_os = "linux")))]
mod fallback;
#[cfg(any(miri, not(target_os = "linux")))]
pub(crate) use fallback::*;

#[cfg(test)]
pub(crate) mod testing {
    use std::ptr::NonNull;

    use super::RegionHandle;

    /// Hands out a zero-initialized heap-backed region for use as a mock
    /// `Platform::reserve()` result.
    ///
    /// The memory is leaked on purpose: the matching mock `release()` is a
    /// no-op and test processes are short-lived.
    pub(crate) fn leaked_region(len: usize) -> RegionHandle {
        let memory: &'static mut [u8] = Vec::leak(vec![0_u8; len]);

        let addr = NonNull::new(memory.as_mut_ptr()).expect("leaked Vec pointer cannot be null");

        RegionHandle::new(addr, len)
    }
}
