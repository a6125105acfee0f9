#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Characterizes the memory subsystem of a multi-core machine by measuring the
//! achieved read bandwidth between every pair of (consumer core, memory-producer
//! core), producing an N×N bandwidth matrix.
//!
//! The intended use is manual diagnosis of NUMA and cache topology effects: on a
//! machine where memory is physically attached to specific processor packages,
//! reading memory that was placed near a remote core is measurably slower than
//! reading memory placed near the reading core, and the matrix makes that
//! asymmetry visible at a glance.
//!
//! # Methodology
//!
//! For each matrix cell `(j, i)`:
//!
//! 1. The measuring thread is bound to consumer core `j`.
//! 2. A dedicated placement thread binds itself to producer core `i`, reserves an
//!    anonymous memory region and writes every byte of it. Under the first-touch
//!    placement policy of the operating system this biases the physical pages
//!    toward memory local to core `i`. The thread then exits and the region is
//!    handed to the measuring thread.
//! 3. The measuring thread repeatedly copies the region into a local scratch
//!    buffer, timing each pass, and reports total bytes moved divided by total
//!    elapsed time.
//!
//! Parallelism appears only as a placement mechanism: every placement thread is
//! joined before measurement starts and no two cells are ever measured
//! concurrently.
//!
//! # Quick start
//!
//! ```no_run
//! use membw_matrix::{DEFAULT_PASSES, DEFAULT_TRANSFER_SIZE, RunInput, run};
//!
//! let input = RunInput {
//!     transfer_size: DEFAULT_TRANSFER_SIZE,
//!     passes: DEFAULT_PASSES,
//!     output: None,
//! };
//!
//! let summary = run(&input).expect("measurement run failed");
//!
//! for row in summary.matrix.rows() {
//!     for cell in row.cells() {
//!         println!(
//!             "{} <- {}: {} bytes/s",
//!             row.consumer(),
//!             cell.producer(),
//!             cell.bytes_per_sec()
//!         );
//!     }
//! }
//! ```
//!
//! A run takes roughly `core_count² × passes` copy durations and cannot be
//! cancelled partway; size the transfer accordingly.
//!
//! # Operating system compatibility
//!
//! Real processor pinning and first-touch placement are implemented for Linux.
//! Other platforms get a fallback that compiles and runs but does not pin
//! threads, so the matrix loses its placement meaning there.

mod error;
mod matrix;
mod output;
mod pal;
mod placement;
mod region;
mod run;
mod sampler;
mod topology;

pub use error::*;
pub use matrix::*;
pub use output::*;
pub use run::*;
pub use topology::*;
