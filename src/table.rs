//! Row and table types, the crate error, and whole-table buffering.
//!
//! Streaming commands never hold more than one row; batch commands (sort,
//! uniq) materialize the stream once into a [`Table`].

use crate::streaming::{CsvReader, CsvWriter};
use std::io::{self, Read, Write};
use thiserror::Error;

/// One CSV record as owned fields.
pub type Row = Vec<String>;

/// Errors that can occur while configuring, reading, transforming or writing CSV.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid option: unsupported encoding '{0}'")]
    UnsupportedEncoding(String),

    #[error("column {0} not found")]
    ColumnNotFound(String),

    #[error("not a number column symbol: {0}")]
    NotNumberSymbol(String),

    #[error("column {0} used before it was resolved")]
    Unresolved(String),

    #[error("column {symbol} (index {index}) is out of range for a row of {width} fields")]
    ColumnOutOfRange {
        symbol: String,
        index: usize,
        width: usize,
    },

    #[error("cannot read csv line")]
    Read(#[source] csv::Error),

    #[error("cannot write csv line")]
    Write(#[source] csv::Error),

    #[error("no header found")]
    MissingHeader,

    #[error("row {row}: cannot parse {value:?} in column {column} as a number")]
    NotANumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {message}")]
    Rejected { row: u64, message: String },
}

pub type Result<T> = std::result::Result<T, CsvError>;

/// A fully buffered CSV stream: optional header plus body rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Option<Row>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Option<Row>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Number of body rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field count of the header, or of the first body row when headerless.
    pub fn width(&self) -> usize {
        self.headers
            .as_ref()
            .or_else(|| self.rows.first())
            .map_or(0, Vec::len)
    }
}

/// Read every remaining row of `input` into a table.
///
/// When `has_header` is set the first row becomes [`Table::headers`]; an empty
/// stream yields an empty table either way.
pub fn read_table<R: Read>(input: &mut CsvReader<R>, has_header: bool) -> Result<Table> {
    let mut rows = input.rows();
    let headers = if has_header {
        rows.next().transpose()?
    } else {
        None
    };
    let rows = rows.collect::<Result<Vec<_>>>()?;
    tracing::debug!(rows = rows.len(), has_header, "buffered table");
    Ok(Table { headers, rows })
}

/// Write a table: header first (if any), then every body row, then flush.
pub fn write_table<W: Write>(output: &mut CsvWriter<W>, table: &Table) -> Result<()> {
    let written = write_table_rows(output, table);
    let flushed = output.flush();
    written.and(flushed)
}

fn write_table_rows<W: Write>(output: &mut CsvWriter<W>, table: &Table) -> Result<()> {
    if let Some(headers) = &table.headers {
        output.write_row(headers)?;
    }
    output.write_rows(&table.rows)
}

/// Parse a UTF-8 CSV string into a table (useful for testing).
pub fn parse_table(content: &str, has_header: bool) -> Result<Table> {
    let mut reader = CsvReader::new(content.as_bytes(), Default::default())?;
    read_table(&mut reader, has_header)
}
