//! Row-serializing writer over an encoding byte sink.

use super::buffers::DEFAULT_OUTPUT_BUFFER;
use super::encoding::{EncodingWriter, OutputEncoding};
use crate::table::{CsvError, Result, Row};
use std::io::Write;

/// Buffered CSV output writer.
///
/// Rows end with `\n` and fields are quoted only when they need it. The BOM,
/// if any, is written on construction, ahead of the first row.
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<EncodingWriter<W>>,
    rows_written: u64,
}

impl<W: Write> CsvWriter<W> {
    /// Create a new CsvWriter with the default buffer.
    ///
    /// A BOM is emitted when the target is UTF-8 and either `bom` is set or
    /// the target is [`OutputEncoding::Utf8Bom`].
    pub fn new(output: W, encoding: OutputEncoding, bom: bool) -> Result<Self> {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output, encoding, bom)
    }

    /// Create a new CsvWriter with specified buffer size.
    pub fn with_capacity(
        capacity: usize,
        output: W,
        encoding: OutputEncoding,
        bom: bool,
    ) -> Result<Self> {
        let sink = EncodingWriter::new(output, encoding, bom)?;
        let writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Necessary)
            .buffer_capacity(capacity)
            .from_writer(sink);

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write one row.
    #[inline]
    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.writer.write_record(row).map_err(CsvError::Write)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write several rows in order.
    pub fn write_rows(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush the output buffer down to the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| CsvError::Write(e.into()))
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| CsvError::Write(e.into_error().into()))?;
        Ok(sink.into_inner())
    }
}
