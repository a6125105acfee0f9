#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the membw_matrix tool.
//!
//! All measurement logic lives in the library; this module only parses the
//! command line and maps the outcome to an exit code.

use std::num::NonZero;
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use membw_matrix::{DEFAULT_PASSES, DEFAULT_TRANSFER_SIZE, RunInput, run};

/// Measures memory read bandwidth between every pair of (consumer, producer)
/// cores and emits the resulting matrix as JSON.
#[derive(FromArgs)]
struct Args {
    /// total number of bytes to move per measurement (default 100 MiB)
    #[argh(option, short = 's')]
    size: Option<usize>,

    /// number of timed copy passes to aggregate per core pair (default 100)
    #[argh(option, short = 'i')]
    passes: Option<NonZero<u32>>,

    /// file to write the JSON bandwidth matrix to; without it, results are
    /// only logged to stderr
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

// Binary entry point - exercising process exit codes requires subprocess
// testing, which the integration tests of the library cover in spirit.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let input = RunInput {
        transfer_size: args.size.unwrap_or(DEFAULT_TRANSFER_SIZE),
        passes: args.passes.unwrap_or(DEFAULT_PASSES),
        output: args.output,
    };

    match run(&input) {
        Ok(summary) => {
            eprintln!(
                "measured {side} x {side} core pairs ({skipped} skipped)",
                side = summary.matrix.side(),
                skipped = summary.skipped_cells
            );

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");

            ExitCode::FAILURE
        }
    }
}
