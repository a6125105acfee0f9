use std::io;

use crate::pal::{Platform, PlatformFacade, RegionHandle};

/// Rounds a requested size up to whole pages, always leaving at least one page
/// of margin.
///
/// The rounded size is the smallest page multiple strictly greater than
/// `size`: even an exact page multiple gains one extra page. Changing this
/// would alter reported bandwidth for page-aligned sizes, so the policy is
/// kept as-is.
pub(crate) fn round_to_pages(size: usize, page_size: usize) -> usize {
    (size / page_size + 1) * page_size
}

/// An anonymous, private, zero-initialized virtual memory region of a
/// page-rounded size, unmapped exactly once on drop.
///
/// Both the producer-placed regions and the sampler's scratch buffer are
/// `MappedRegion`s; only how (and where) their pages get physically backed
/// differs.
#[derive(Debug)]
pub(crate) struct MappedRegion {
    handle: RegionHandle,
    requested: usize,
    platform: PlatformFacade,
}

impl MappedRegion {
    /// Reserves a region of `size` bytes, rounded up to whole pages.
    ///
    /// The reservation is virtual only; pages are physically backed when first
    /// written, which is what the placement logic exploits.
    pub(crate) fn reserve(platform: &PlatformFacade, size: usize) -> io::Result<Self> {
        let rounded = round_to_pages(size, platform.page_size());

        let handle = platform.reserve(rounded)?;

        Ok(Self {
            handle,
            requested: size,
            platform: platform.clone(),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.handle.addr().as_ptr()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.handle.addr().as_ptr()
    }

    /// The size the caller asked for, before page rounding.
    pub(crate) fn requested_len(&self) -> usize {
        self.requested
    }

    #[cfg(test)]
    pub(crate) fn mapped_len(&self) -> usize {
        self.handle.len()
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        self.platform.release(self.handle);
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

    #[test]
    fn rounding_goes_to_next_page_boundary() {
        assert_eq!(round_to_pages(1, PAGE), PAGE);
        assert_eq!(round_to_pages(PAGE - 1, PAGE), PAGE);
        assert_eq!(round_to_pages(PAGE + 1, PAGE), 2 * PAGE);
    }

    #[test]
    fn exact_page_multiples_gain_a_full_margin_page() {
        assert_eq!(round_to_pages(PAGE, PAGE), 2 * PAGE);
        assert_eq!(round_to_pages(10 * PAGE, PAGE), 11 * PAGE);
    }

    #[test]
    fn zero_size_still_reserves_one_page() {
        assert_eq!(round_to_pages(0, PAGE), PAGE);
    }

    #[test]
    fn reservation_is_page_rounded_and_released_once() {
        let mut platform = MockPlatform::new();
        platform.expect_page_size().return_const(PAGE);
        platform
            .expect_reserve()
            .with(eq(2 * PAGE))
            .times(1)
            .returning(|len| Ok(leaked_region(len)));
        platform.expect_release().times(1).return_const(());

        let facade = PlatformFacade::from_mock(platform);

        let region = MappedRegion::reserve(&facade, PAGE).unwrap();
        assert_eq!(region.requested_len(), PAGE);
        assert_eq!(region.mapped_len(), 2 * PAGE);

        drop(region);

        // Mock expectations verify the single release on drop.
    }
}
