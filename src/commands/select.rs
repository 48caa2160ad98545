//! Select command implementation.
//!
//! Emits only the requested columns, in the order they were requested, with
//! repeated columns dropped.

use crate::column::{require_index_symbol, ColumnSet, ColumnSymbol};
use crate::streaming::{CsvReader, CsvWriter, ProcessStats, RecordProcessor, RecordStages};
use crate::table::{CsvError, Result, Row};
use std::io::{Read, Write};

/// Select command configuration.
#[derive(Debug, Clone)]
pub struct SelectCommand {
    columns: Vec<ColumnSymbol>,
    has_header: bool,
}

impl SelectCommand {
    /// At least one column is required; without a header all must be numbers.
    pub fn new(columns: Vec<ColumnSymbol>, has_header: bool) -> Result<Self> {
        if columns.is_empty() {
            return Err(CsvError::InvalidOption(
                "--columns needs at least one column".to_string(),
            ));
        }
        if !has_header {
            for column in &columns {
                require_index_symbol(column, "columns")?;
            }
        }
        Ok(Self {
            columns,
            has_header,
        })
    }

    /// Stream `input` to `output` keeping only the selected columns.
    pub fn run<R: Read, W: Write>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
    ) -> Result<ProcessStats> {
        let mut stages = SelectStages::new(self);
        let stats = RecordProcessor::new(self.has_header).run(input, output, &mut stages)?;
        tracing::info!(rows = stats.rows_written, "select finished");
        Ok(stats)
    }
}

/// Per-stream state of a select pass.
#[derive(Debug)]
pub struct SelectStages<'a> {
    command: &'a SelectCommand,
    columns: Option<ColumnSet>,
}

impl<'a> SelectStages<'a> {
    pub fn new(command: &'a SelectCommand) -> Self {
        Self {
            command,
            columns: None,
        }
    }
}

impl RecordStages for SelectStages<'_> {
    fn header(&mut self, header: Row) -> Result<Row> {
        let columns = ColumnSet::resolve(&self.command.columns, Some(header.as_slice()))?;
        tracing::debug!(columns = ?columns.indices(), "resolved select columns");
        let selected = columns.select(&header)?;
        self.columns = Some(columns);
        Ok(selected)
    }

    fn pre_body(&mut self) -> Result<()> {
        if self.columns.is_none() {
            self.columns = Some(ColumnSet::resolve(&self.command.columns, None)?);
        }
        Ok(())
    }

    fn record(&mut self, row: Row) -> Result<Option<Row>> {
        let columns = self
            .columns
            .as_ref()
            .ok_or_else(|| CsvError::Unresolved("--columns".to_string()))?;
        columns.select(&row).map(Some)
    }
}
