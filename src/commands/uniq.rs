//! Uniq command implementation.
//!
//! Drops body rows whose key was already seen, keeping the first occurrence.
//! The key is the listed columns, or the whole row when none are listed.
//! Unlike `uniq(1)` duplicates need not be adjacent, so the table is buffered.

use crate::column::{require_index_symbol, ColumnSet, ColumnSymbol};
use crate::streaming::{CsvReader, CsvWriter};
use crate::table::{read_table, write_table, Result, Row, Table};
use rustc_hash::FxHashSet;
use std::io::{Read, Write};

/// Uniq command configuration.
#[derive(Debug, Clone)]
pub struct UniqCommand {
    columns: Vec<ColumnSymbol>,
    has_header: bool,
}

impl UniqCommand {
    pub fn new(columns: Vec<ColumnSymbol>, has_header: bool) -> Result<Self> {
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

    fn key_columns(&self, table: &Table) -> Result<ColumnSet> {
        let header = table.headers.as_deref();
        if self.columns.is_empty() {
            Ok(ColumnSet::all(table.width(), header))
        } else {
            ColumnSet::resolve(&self.columns, header)
        }
    }

    /// Remove repeated rows from a buffered table.
    pub fn dedup(&self, table: Table) -> Result<Table> {
        let columns = self.key_columns(&table)?;
        tracing::debug!(columns = ?columns.indices(), "uniq key columns");

        let keep = {
            let mut seen: FxHashSet<Vec<&str>> = FxHashSet::default();
            let mut keep = Vec::with_capacity(table.rows.len());
            for row in &table.rows {
                keep.push(seen.insert(columns.key(row)?));
            }
            keep
        };

        let rows: Vec<Row> = table
            .rows
            .into_iter()
            .zip(keep)
            .filter_map(|(row, keep)| keep.then_some(row))
            .collect();
        Ok(Table::new(table.headers, rows))
    }

    /// Buffer `input`, drop repeats, write the rest.
    pub fn run<R: Read, W: Write>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
    ) -> Result<()> {
        let table = read_table(input, self.has_header)?;
        let before = table.len();
        let unique = self.dedup(table)?;
        write_table(output, &unique)?;
        tracing::info!(
            rows = unique.len(),
            dropped = before - unique.len(),
            "uniq finished"
        );
        Ok(())
    }
}
