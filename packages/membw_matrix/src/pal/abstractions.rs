use std::fmt::Debug;
use std::io;
use std::ptr::NonNull;

use crate::ProcessorId;

/// An anonymous virtual memory reservation handed out by [`Platform::reserve()`].
///
/// This is only an address + length pair; ownership semantics (unmap exactly
/// once) live in `MappedRegion`, which wraps the handle.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RegionHandle {
    addr: NonNull<u8>,
    len: usize,
}

impl RegionHandle {
    pub(crate) fn new(addr: NonNull<u8>, len: usize) -> Self {
        Self { addr, len }
    }

    pub(crate) fn addr(&self) -> NonNull<u8> {
        self.addr
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

// SAFETY: the handle stands for exclusive ownership of a whole virtual memory
// range; nothing about that range is tied to the thread that created it.
unsafe impl Send for RegionHandle {}
// SAFETY: as above; shared references to the handle only expose the address.
unsafe impl Sync for RegionHandle {}

/// Everything the measurement engine needs from the operating system.
///
/// All OS calls must go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Identifiers of the processors available for measurement, ascending.
    ///
    /// May legally return an empty list (e.g. in a heavily restricted
    /// environment); deciding that this is fatal is the caller's concern.
    fn online_processors(&self) -> io::Result<Vec<ProcessorId>>;

    /// Restricts the calling thread to run only on the given processor.
    fn bind_current_thread_to(&self, processor: ProcessorId) -> io::Result<()>;

    /// Reserves an anonymous, private, zero-initialized mapping of `len` bytes.
    fn reserve(&self, len: usize) -> io::Result<RegionHandle>;

    /// Releases a reservation previously handed out by [`Platform::reserve()`].
    ///
    /// Must be called exactly once per successful reservation.
    fn release(&self, region: RegionHandle);

    /// The virtual memory page size of the platform, in bytes.
    fn page_size(&self) -> usize;
}
