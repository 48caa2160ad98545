//! Headers command implementation.
//!
//! Lists the columns of a CSV as `index,name` rows so they can be used as
//! column symbols. Without a header only the indices of the first row are
//! listed. Only the first row is read.

use crate::streaming::{CsvReader, CsvWriter};
use crate::table::{CsvError, Result, Row};
use std::io::{Read, Write};

/// Headers command configuration.
#[derive(Debug, Clone)]
pub struct HeadersCommand {
    pub has_header: bool,
}

impl Default for HeadersCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadersCommand {
    pub fn new() -> Self {
        Self { has_header: true }
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// One output row per column of `first`.
    pub fn listing(&self, first: Row) -> Vec<Row> {
        if self.has_header {
            first
                .into_iter()
                .enumerate()
                .map(|(index, name)| vec![index.to_string(), name])
                .collect()
        } else {
            (0..first.len()).map(|index| vec![index.to_string()]).collect()
        }
    }

    pub fn run<R: Read, W: Write>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
    ) -> Result<()> {
        let first = input.read_row()?.ok_or(CsvError::MissingHeader)?;
        let rows = self.listing(first);
        tracing::debug!(columns = rows.len(), "listing columns");
        let written = output.write_rows(&rows);
        let flushed = output.flush();
        written.and(flushed)
    }
}
