//! Cat command implementation.
//!
//! Copies rows unchanged from input to output. Useful on its own for
//! re-encoding (e.g. Shift_JIS to UTF-8) and for adding or stripping a BOM.

use crate::streaming::{CsvReader, CsvWriter, ProcessStats, RecordProcessor, RecordStages};
use crate::table::{Result, Row};
use std::io::{Read, Write};

/// Stages that emit every row as read.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl RecordStages for PassThrough {
    #[inline]
    fn record(&mut self, row: Row) -> Result<Option<Row>> {
        Ok(Some(row))
    }
}

/// Cat command configuration.
#[derive(Debug, Clone)]
pub struct CatCommand {
    pub has_header: bool,
}

impl Default for CatCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CatCommand {
    pub fn new() -> Self {
        Self { has_header: true }
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Copy every row of `input` to `output`.
    pub fn run<R: Read, W: Write>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
    ) -> Result<ProcessStats> {
        let stats = RecordProcessor::new(self.has_header).run(input, output, &mut PassThrough)?;
        tracing::info!(rows = stats.rows_written, "cat finished");
        Ok(stats)
    }
}
