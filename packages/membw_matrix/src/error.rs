use std::io;

use thiserror::Error;

use crate::ProcessorId;

/// Errors that abort a bandwidth matrix run.
///
/// Recoverable per-cell conditions are intentionally not represented here: a
/// failed producer-side memory reservation skips that one cell and a failed
/// sampler scratch reservation yields a `0.0` bandwidth sentinel. Neither
/// changes the exit status of a run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The topology provider reported zero usable cores.
    #[error("no online processors detected")]
    NoCoresDetected,

    /// Enumerating the processors of the machine failed outright.
    #[error("failed to enumerate online processors: {source}")]
    Topology {
        /// The underlying operating system error.
        #[source]
        source: io::Error,
    },

    /// The measuring thread could not be bound to a consumer core.
    ///
    /// Without a bound reading context, no cell of the matrix is trustworthy,
    /// so there is no recovery path.
    #[error("failed to bind the measuring thread to processor {processor}: {source}")]
    ConsumerBindFailed {
        /// The processor the bind targeted.
        processor: ProcessorId,
        /// The underlying operating system error.
        #[source]
        source: io::Error,
    },

    /// A placement thread could not be bound to its producer core.
    ///
    /// A measurement with unknown memory placement is worse than no
    /// measurement, so this aborts the whole run.
    #[error("failed to bind a placement thread to processor {processor}: {source}")]
    PlacementBindFailed {
        /// The processor the bind targeted.
        processor: ProcessorId,
        /// The underlying operating system error.
        #[source]
        source: io::Error,
    },

    /// A placement thread terminated without reporting a result.
    #[error("a memory placement thread panicked")]
    PlacementThreadPanicked,

    /// The output boundary could not be opened or written.
    #[error("failed to write measurement output: {source}")]
    Output {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A specialized `Result` type for measurement operations, returning the
/// crate's [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn bind_failure_names_the_processor() {
        let error = Error::ConsumerBindFailed {
            processor: 7,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };

        assert!(error.to_string().contains("processor 7"));
    }
}
