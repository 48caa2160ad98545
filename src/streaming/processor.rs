//! Staged single-pass record processor.
//!
//! One pass over the input, driving the stages of a [`RecordStages`] value in
//! a fixed order:
//!
//! 1. `header`, once, with the first row (only when the input has a header)
//! 2. `pre_body`, once, before the first body row is read
//! 3. `record`, for every remaining row
//!
//! Rows returned by `header` and `record` are written immediately, in order.
//! Any error, from the tokenizer or from a stage, ends the pass; the writer is
//! still flushed so rows already produced stay in the output.

use super::input::CsvReader;
use super::output::CsvWriter;
use crate::table::{Result, Row};
use std::fmt;
use std::io::{self, Read, Write};

/// Caller-supplied stages of a record pass.
///
/// Only `record` is required; the other stages default to pass-through.
pub trait RecordStages {
    /// Receives the raw header row and returns the header to emit.
    fn header(&mut self, header: Row) -> Result<Row> {
        Ok(header)
    }

    /// Runs once between the header and the first body row. Used to finish
    /// column resolution when there is no header.
    fn pre_body(&mut self) -> Result<()> {
        Ok(())
    }

    /// Transforms one body row. `Ok(None)` suppresses the row.
    fn record(&mut self, row: Row) -> Result<Option<Row>>;
}

/// Counters from one processor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub header_seen: bool,
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_suppressed: u64,
}

impl fmt::Display for ProcessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} written={} suppressed={} header={}",
            self.rows_read, self.rows_written, self.rows_suppressed, self.header_seen
        )
    }
}

/// Drives [`RecordStages`] over a [`CsvReader`].
#[derive(Debug, Clone, Copy)]
pub struct RecordProcessor {
    has_header: bool,
}

impl RecordProcessor {
    pub fn new(has_header: bool) -> Self {
        Self { has_header }
    }

    /// Run the stages and stream every produced row to `output`.
    ///
    /// `output` is flushed on every exit path; the first error wins.
    pub fn run<R, W, S>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
        stages: &mut S,
    ) -> Result<ProcessStats>
    where
        R: Read,
        W: Write,
        S: RecordStages + ?Sized,
    {
        let result = self.drive(input, Some(&mut *output), stages);
        let flushed = output.flush();
        let stats = result?;
        flushed?;
        Ok(stats)
    }

    /// Run the stages without a writer; produced rows are counted and dropped.
    pub fn run_without_output<R, S>(
        &self,
        input: &mut CsvReader<R>,
        stages: &mut S,
    ) -> Result<ProcessStats>
    where
        R: Read,
        S: RecordStages + ?Sized,
    {
        self.drive::<R, io::Sink, S>(input, None, stages)
    }

    fn drive<R, W, S>(
        &self,
        input: &mut CsvReader<R>,
        mut output: Option<&mut CsvWriter<W>>,
        stages: &mut S,
    ) -> Result<ProcessStats>
    where
        R: Read,
        W: Write,
        S: RecordStages + ?Sized,
    {
        let mut stats = ProcessStats::default();

        if self.has_header {
            let Some(raw) = input.read_row()? else {
                tracing::debug!("input is empty; no header row");
                return Ok(stats);
            };
            stats.rows_read += 1;
            let header = stages.header(raw)?;
            stats.header_seen = true;
            if let Some(out) = output.as_deref_mut() {
                out.write_row(&header)?;
                stats.rows_written += 1;
            }
            tracing::debug!(columns = header.len(), "header stage done");
        }

        stages.pre_body()?;

        while let Some(row) = input.read_row()? {
            stats.rows_read += 1;
            match stages.record(row)? {
                Some(row) => {
                    if let Some(out) = output.as_deref_mut() {
                        out.write_row(&row)?;
                        stats.rows_written += 1;
                    }
                }
                None => stats.rows_suppressed += 1,
            }
        }

        tracing::debug!(%stats, "record pass finished");
        Ok(stats)
    }
}
