/// Measured read bandwidth for one (consumer, producer) core pair.
///
/// Written once when the cell is measured, never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    producer: usize,
    bytes_per_sec: f64,
}

impl Cell {
    /// The matrix index of the producer core whose memory was read.
    #[must_use]
    #[inline]
    pub fn producer(&self) -> usize {
        self.producer
    }

    /// Achieved read bandwidth in bytes per second.
    #[must_use]
    #[inline]
    pub fn bytes_per_sec(&self) -> f64 {
        self.bytes_per_sec
    }
}

/// One consumer row of the bandwidth matrix.
///
/// Cells are ordered by strictly ascending producer index. A producer whose
/// memory could not be reserved has no cell at all; skipped cells are absent,
/// never present with a placeholder.
#[derive(Clone, Debug)]
pub struct Row {
    consumer: usize,
    cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(consumer: usize) -> Self {
        Self {
            consumer,
            cells: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, producer: usize, bytes_per_sec: f64) {
        debug_assert!(
            self.cells.last().is_none_or(|cell| cell.producer < producer),
            "cells must be appended in strictly ascending producer order"
        );

        self.cells.push(Cell {
            producer,
            bytes_per_sec,
        });
    }

    /// The matrix index of the consumer core this row was measured from.
    #[must_use]
    #[inline]
    pub fn consumer(&self) -> usize {
        self.consumer
    }

    /// The measured cells, ascending by producer index.
    #[must_use]
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Bandwidth of the cell for `producer`, if that cell was measured.
    #[must_use]
    pub fn get(&self, producer: usize) -> Option<f64> {
        self.cells
            .iter()
            .find(|cell| cell.producer == producer)
            .map(Cell::bytes_per_sec)
    }
}

/// The full consumer × producer read-bandwidth matrix.
///
/// Rows are appended in strictly ascending consumer order; a complete matrix
/// has exactly one row per core.
#[derive(Clone, Debug)]
pub struct BandwidthMatrix {
    side: usize,
    rows: Vec<Row>,
}

impl BandwidthMatrix {
    pub(crate) fn new(side: usize) -> Self {
        Self {
            side,
            rows: Vec::with_capacity(side),
        }
    }

    pub(crate) fn push_row(&mut self, row: Row) {
        debug_assert_eq!(
            row.consumer,
            self.rows.len(),
            "rows must be appended in ascending consumer order"
        );

        self.rows.push(row);
    }

    /// The side length of the matrix, equal to the core count.
    #[must_use]
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Whether every consumer row has been recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.side
    }

    /// The recorded rows, ascending by consumer index.
    #[must_use]
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Bandwidth of the cell at (`consumer`, `producer`), if measured.
    #[must_use]
    pub fn get(&self, consumer: usize, producer: usize) -> Option<f64> {
        self.rows.get(consumer).and_then(|row| row.get(producer))
    }
}
