use std::fmt::Debug;
use std::io;
#[cfg(test)]
use std::sync::Arc;

use crate::ProcessorId;
#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform, RegionHandle};

/// Enum to hide the real/mock choice behind a single wrapper type.
///
/// The facade is cheap to clone and can cross thread boundaries, which the
/// placement threads rely on.
#[derive(Clone)]
pub(crate) enum PlatformFacade {
    Target(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BUILD_TARGET_PLATFORM)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Platform for PlatformFacade {
    fn online_processors(&self) -> io::Result<Vec<ProcessorId>> {
        match self {
            Self::Target(platform) => platform.online_processors(),
            #[cfg(test)]
            Self::Mock(mock) => mock.online_processors(),
        }
    }

    fn bind_current_thread_to(&self, processor: ProcessorId) -> io::Result<()> {
        match self {
            Self::Target(platform) => platform.bind_current_thread_to(processor),
            #[cfg(test)]
            Self::Mock(mock) => mock.bind_current_thread_to(processor),
        }
    }

    fn reserve(&self, len: usize) -> io::Result<RegionHandle> {
        match self {
            Self::Target(platform) => platform.reserve(len),
            #[cfg(test)]
            Self::Mock(mock) => mock.reserve(len),
        }
    }

    fn release(&self, region: RegionHandle) {
        match self {
            Self::Target(platform) => platform.release(region),
            #[cfg(test)]
            Self::Mock(mock) => mock.release(region),
        }
    }

    fn page_size(&self) -> usize {
        match self {
            Self::Target(platform) => platform.page_size(),
            #[cfg(test)]
            Self::Mock(mock) => mock.page_size(),
        }
    }
}

impl Debug for PlatformFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}
