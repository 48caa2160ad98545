//! Filter command implementation.
//!
//! Keeps body rows whose column equals a value exactly, or drops them with
//! `--invert`. The header is always kept.

use crate::column::{require_index_symbol, ColumnSymbol, ResolvedColumn};
use crate::streaming::{CsvReader, CsvWriter, ProcessStats, RecordProcessor, RecordStages};
use crate::table::{CsvError, Result, Row};
use std::io::{Read, Write};

/// Filter command configuration.
#[derive(Debug, Clone)]
pub struct FilterCommand {
    column: ColumnSymbol,
    pub value: String,
    pub invert: bool,
    has_header: bool,
}

impl FilterCommand {
    pub fn new(column: &str, value: impl Into<String>, has_header: bool) -> Result<Self> {
        let column = ColumnSymbol::parse(column)?
            .ok_or_else(|| CsvError::InvalidOption("--column is required".to_string()))?;
        if !has_header {
            require_index_symbol(&column, "column")?;
        }
        Ok(Self {
            column,
            value: value.into(),
            invert: false,
            has_header,
        })
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    #[inline]
    fn keeps(&self, field: &str) -> bool {
        (field == self.value) != self.invert
    }

    /// Stream `input` to `output`, suppressing rows that do not match.
    pub fn run<R: Read, W: Write>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
    ) -> Result<ProcessStats> {
        let mut stages = FilterStages::new(self);
        let stats = RecordProcessor::new(self.has_header).run(input, output, &mut stages)?;
        tracing::info!(
            kept = stats.rows_written.saturating_sub(u64::from(stats.header_seen)),
            dropped = stats.rows_suppressed,
            "filter finished"
        );
        Ok(stats)
    }
}

/// Per-stream state of a filter pass.
#[derive(Debug)]
pub struct FilterStages<'a> {
    command: &'a FilterCommand,
    column: Option<ResolvedColumn>,
}

impl<'a> FilterStages<'a> {
    pub fn new(command: &'a FilterCommand) -> Self {
        Self {
            command,
            column: None,
        }
    }
}

impl RecordStages for FilterStages<'_> {
    fn header(&mut self, header: Row) -> Result<Row> {
        let column = self.command.column.resolve(Some(header.as_slice()))?;
        tracing::debug!(column = column.label(), index = ?column.index(), "resolved filter column");
        self.column = Some(column);
        Ok(header)
    }

    fn pre_body(&mut self) -> Result<()> {
        if self.column.is_none() {
            self.column = Some(self.command.column.resolve(None)?);
        }
        Ok(())
    }

    fn record(&mut self, row: Row) -> Result<Option<Row>> {
        let column = self
            .column
            .as_ref()
            .ok_or_else(|| CsvError::Unresolved(self.command.column.to_string()))?;
        let keep = self.command.keeps(column.field(&row)?);
        Ok(keep.then_some(row))
    }
}
