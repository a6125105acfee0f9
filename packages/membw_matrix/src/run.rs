use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZero;
use std::path::PathBuf;

use new_zealand::nz;

use crate::pal::PlatformFacade;
use crate::placement::{self, PlacementOutcome};
use crate::sampler::{CopyPass, Sampler, WallClockCopy};
use crate::{BandwidthMatrix, Error, MatrixWriter, Result, Row, Topology};

/// Default total transfer size per measurement: 100 MiB.
pub const DEFAULT_TRANSFER_SIZE: usize = 100 * 1024 * 1024;

/// Default number of timed copy passes aggregated per core pair.
pub const DEFAULT_PASSES: NonZero<u32> = nz!(100);

const BYTES_PER_GIB: f64 = 1_073_741_824.0;

/// Inputs for one full matrix run.
#[derive(Clone, Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain configuration input; adding a field is an accepted breaking change"
)]
pub struct RunInput {
    /// Total number of bytes to move per measurement, before page rounding.
    pub transfer_size: usize,

    /// Number of timed copy passes aggregated per core pair.
    pub passes: NonZero<u32>,

    /// File to write the JSON bandwidth matrix to. Without it, results are
    /// only logged to stderr.
    pub output: Option<PathBuf>,
}

impl Default for RunInput {
    fn default() -> Self {
        Self {
            transfer_size: DEFAULT_TRANSFER_SIZE,
            passes: DEFAULT_PASSES,
            output: None,
        }
    }
}

/// What a completed run produced.
#[derive(Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain result bundle; adding a field is an accepted breaking change"
)]
pub struct RunSummary {
    /// The measured matrix. Complete in the sense that every row was
    /// attempted; individual cells may still be absent where producer-side
    /// memory reservation failed.
    pub matrix: BandwidthMatrix,

    /// Number of cells skipped due to failed producer-side reservations.
    pub skipped_cells: usize,
}

/// Measures the full consumer × producer bandwidth matrix.
///
/// Rows are measured and flushed in strictly ascending consumer-core order
/// and, within a row, cells in strictly ascending producer-core order, so a
/// consumer of the output file may rely on incremental progress.
///
/// The calling thread's scheduling affinity is modified during the run and
/// left bound to the last consumer core afterwards. The run blocks until all
/// `core_count²` cells have been attempted; there is no cancellation.
///
/// # Errors
///
/// Fatal conditions ([`Error::NoCoresDetected`], bind failures, output I/O
/// failures) abort the run; output already flushed is left as-is. Per-cell
/// reservation failures are not errors, they only show up as skipped cells.
pub fn run(input: &RunInput) -> Result<RunSummary> {
    let platform = PlatformFacade::target();

    match &input.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| Error::Output { source })?;
            let mut sink = BufWriter::new(file);

            execute(
                input,
                &platform,
                Some(&mut sink as &mut dyn Write),
                &WallClockCopy,
            )
        }
        None => execute(input, &platform, None, &WallClockCopy),
    }
}

fn execute(
    input: &RunInput,
    platform: &PlatformFacade,
    output: Option<&mut dyn Write>,
    copy: &dyn CopyPass,
) -> Result<RunSummary> {
    // The document is opened before topology discovery, mirroring the
    // no-rollback contract: a fatal error later leaves a truncated document.
    let mut writer = output
        .map(MatrixWriter::new)
        .transpose()
        .map_err(|source| Error::Output { source })?;

    let topology = Topology::with_platform(platform)?;

    let sampler = Sampler::new(platform.clone(), input.passes);

    let mut matrix = BandwidthMatrix::new(topology.core_count());
    let mut skipped_cells = 0_usize;

    for &consumer in topology.cores().iter() {
        // The reading agent must physically sit on the consumer core for the
        // whole row.
        placement::bind_current_thread(platform, consumer).map_err(|source| {
            Error::ConsumerBindFailed {
                processor: consumer.processor_id(),
                source,
            }
        })?;

        let mut row = Row::new(consumer.index());

        for &producer in topology.cores().iter() {
            match placement::place_near(platform, producer, input.transfer_size)? {
                PlacementOutcome::Placed(region) => {
                    let bytes_per_sec = sampler.measure_with(&region, copy);

                    eprintln!(
                        "bandwidth {consumer} <- {producer}: {gib:.3} GiB/s",
                        gib = bytes_per_sec / BYTES_PER_GIB
                    );

                    row.push(producer.index(), bytes_per_sec);

                    // The region drops here, so at most one producer
                    // allocation is ever outstanding.
                }
                PlacementOutcome::ReservationFailed(error) => {
                    skipped_cells += 1;

                    eprintln!(
                        "skipping {consumer} <- {producer}: memory reservation failed: {error}"
                    );
                }
            }
        }

        if let Some(writer) = writer.as_mut() {
            writer
                .write_row(&row)
                .map_err(|source| Error::Output { source })?;
        }

        matrix.push_row(row);
    }

    if let Some(writer) = writer {
        writer
            .finish()
            .map_err(|source| Error::Output { source })?;
    }

    Ok(RunSummary {
        matrix,
        skipped_cells,
    })
}
