use derive_more::Display;
use nonempty::NonEmpty;

use crate::pal::{Platform, PlatformFacade};
use crate::{Error, Result};

/// Identifies a specific processor.
///
/// This will match the numeric identifier used by standard tooling of the
/// operating system. The values are not guaranteed to be sequential/contiguous
/// or to start from zero, which is why cores carry a separate matrix index.
pub type ProcessorId = u32;

/// One schedulable hardware execution unit exposed by the topology provider.
///
/// A core pairs a dense matrix index in `[0, core_count)` with the processor
/// identifier the operating system uses for affinity control.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("core {index} (processor {processor})")]
pub struct Core {
    index: usize,
    processor: ProcessorId,
}

impl Core {
    pub(crate) fn new(index: usize, processor: ProcessorId) -> Self {
        Self { index, processor }
    }

    /// The dense matrix index of this core, in `[0, core_count)`.
    #[must_use]
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The operating system identifier of the processor backing this core.
    #[must_use]
    #[inline]
    pub fn processor_id(&self) -> ProcessorId {
        self.processor
    }
}

/// The set of cores addressable by the measurement engine, in ascending
/// processor-id order.
///
/// On Linux this is the set of online processors that the current thread is
/// also allowed to run on, so that binding to any enumerated core can succeed.
/// A topology always contains at least one core; discovering zero cores is a
/// fatal condition because no measurement is possible at all.
#[derive(Clone, Debug)]
pub struct Topology {
    cores: NonEmpty<Core>,
}

impl Topology {
    /// Enumerates the cores of the machine this process is running on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Topology`] if processor enumeration fails and
    /// [`Error::NoCoresDetected`] if it succeeds but yields nothing.
    pub fn current() -> Result<Self> {
        Self::with_platform(&PlatformFacade::target())
    }

    pub(crate) fn with_platform(platform: &PlatformFacade) -> Result<Self> {
        let processors = platform
            .online_processors()
            .map_err(|source| Error::Topology { source })?;

        let cores = processors
            .into_iter()
            .enumerate()
            .map(|(index, processor)| Core::new(index, processor))
            .collect::<Vec<_>>();

        let cores = NonEmpty::from_vec(cores).ok_or(Error::NoCoresDetected)?;

        Ok(Self { cores })
    }

    /// The number of cores, which is also the side length of the matrix.
    #[must_use]
    #[inline]
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// The enumerated cores, ordered by ascending matrix index.
    #[must_use]
    #[inline]
    pub fn cores(&self) -> &NonEmpty<Core> {
        &self.cores
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io;

    use super::*;
    use crate::pal::MockPlatform;

    #[test]
    fn cores_are_indexed_densely_in_enumeration_order() {
        let mut platform = MockPlatform::new();
        platform
            .expect_online_processors()
            .returning(|| Ok(vec![0, 2, 5]));

        let topology = Topology::with_platform(&PlatformFacade::from_mock(platform)).unwrap();

        assert_eq!(topology.core_count(), 3);

        let cores: Vec<_> = topology.cores().iter().copied().collect();
        assert_eq!(cores[0], Core::new(0, 0));
        assert_eq!(cores[1], Core::new(1, 2));
        assert_eq!(cores[2], Core::new(2, 5));
    }

    #[test]
    fn zero_processors_is_fatal() {
        let mut platform = MockPlatform::new();
        platform.expect_online_processors().returning(|| Ok(vec![]));

        let result = Topology::with_platform(&PlatformFacade::from_mock(platform));

        assert!(matches!(result, Err(Error::NoCoresDetected)));
    }

    #[test]
    fn enumeration_failure_is_fatal() {
        let mut platform = MockPlatform::new();
        platform
            .expect_online_processors()
            .returning(|| Err(io::Error::other("sysfs unavailable")));

        let result = Topology::with_platform(&PlatformFacade::from_mock(platform));

        assert!(matches!(result, Err(Error::Topology { .. })));
    }
}
