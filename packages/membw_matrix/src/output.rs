use std::io::{self, Write};

use crate::Row;

/// Streams a bandwidth matrix as nested JSON, one consumer row at a time.
///
/// The external representation is a mapping from consumer-core index (as a
/// decimal string) to an inner mapping from producer-core index to bytes per
/// second:
///
/// ```json
/// {"0":{"0":11811160064.0,"1":5905580032.0},"1":{"0":5905580032.0,"1":11811160064.0}}
/// ```
///
/// Rows are written and flushed incrementally so a consumer tailing the file
/// can display progress; the stream cannot re-seek, which is why row order is
/// a hard guarantee of the engine. If the run dies partway, whatever was
/// flushed stays as-is (a truncated, possibly invalid document).
#[derive(Debug)]
pub struct MatrixWriter<W: Write> {
    inner: W,
    rows_written: usize,
}

impl<W: Write> MatrixWriter<W> {
    /// Starts a new document by writing the opening brace.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the sink rejects the write.
    pub fn new(mut inner: W) -> io::Result<Self> {
        write!(inner, "{{")?;

        Ok(Self {
            inner,
            rows_written: 0,
        })
    }

    /// Writes one complete consumer row and flushes the sink.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the sink rejects the write.
    pub fn write_row(&mut self, row: &Row) -> io::Result<()> {
        if self.rows_written > 0 {
            write!(self.inner, ",")?;
        }

        write!(self.inner, "\"{}\":{{", row.consumer())?;

        for (position, cell) in row.cells().iter().enumerate() {
            if position > 0 {
                write!(self.inner, ",")?;
            }

            // {:?} keeps the decimal point on round values, so every cell
            // reads as a floating-point number.
            write!(self.inner, "\"{}\":{:?}", cell.producer(), cell.bytes_per_sec())?;
        }

        write!(self.inner, "}}")?;
        self.inner.flush()?;

        self.rows_written += 1;

        Ok(())
    }

    /// Writes the closing brace and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the sink rejects the write.
    pub fn finish(mut self) -> io::Result<W> {
        write!(self.inner, "}}")?;
        self.inner.flush()?;

        Ok(self.inner)
    }
}
