//! Sort command implementation.
//!
//! Sorts body rows by one column; the header is written first and never moves.
//!
//! Order:
//! 1. Empty keys under `first` / `last` go to the very start / end of the
//!    output, whichever direction was requested.
//! 2. Remaining keys compare as bytes (`text`) or as `i64` (`number`),
//!    reversed when descending.
//! 3. Ties: input order preserved (stable sort), in both directions.
//!
//! Keys are extracted and parsed once up front, so a bad number fails before
//! any sorting and the comparator itself cannot fail.

use crate::column::{require_index_symbol, ColumnSymbol, ResolvedColumn};
use crate::streaming::{CsvReader, CsvWriter};
use crate::table::{read_table, write_table, CsvError, Result, Row, Table};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// How key fields are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// Byte-wise lexicographic.
    #[default]
    Text,
    /// Parsed as signed 64-bit integers.
    Number,
}

impl FromStr for DataType {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            _ => Err(CsvError::InvalidOption(format!(
                "unsupported sort data type '{s}' (expected text or number)"
            ))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Number => "number",
        })
    }
}

/// Where rows with an empty key go.
///
/// `First` and `Last` are anchored to the output: `First` rows come before
/// everything else even when sorting descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyHandling {
    /// Compare empty like any other value: the smallest string for `text`,
    /// zero for `number`.
    #[default]
    Natural,
    First,
    Last,
}

impl FromStr for EmptyHandling {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "natural" => Ok(Self::Natural),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            _ => Err(CsvError::InvalidOption(format!(
                "unsupported empty handling '{s}' (expected natural, first or last)"
            ))),
        }
    }
}

impl fmt::Display for EmptyHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Natural => "natural",
            Self::First => "first",
            Self::Last => "last",
        })
    }
}

/// Comparison policy for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortKeyPolicy {
    pub data_type: DataType,
    pub empty: EmptyHandling,
    pub descending: bool,
}

/// Pre-computed key of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey<'r> {
    /// Empty field under `first` / `last`.
    Empty,
    Text(&'r str),
    Number(i64),
}

impl SortKeyPolicy {
    fn key<'r>(
        &self,
        field: &'r str,
        row: usize,
        column: &ResolvedColumn,
    ) -> Result<SortKey<'r>> {
        if field.is_empty() {
            return Ok(match (self.empty, self.data_type) {
                (EmptyHandling::Natural, DataType::Text) => SortKey::Text(""),
                (EmptyHandling::Natural, DataType::Number) => SortKey::Number(0),
                _ => SortKey::Empty,
            });
        }
        match self.data_type {
            DataType::Text => Ok(SortKey::Text(field)),
            DataType::Number => field
                .parse()
                .map(SortKey::Number)
                .map_err(|_| CsvError::NotANumber {
                    row,
                    column: column.label().to_string(),
                    value: field.to_string(),
                }),
        }
    }

    fn row_key<'r>(
        &self,
        row: &'r [String],
        position: usize,
        column: &ResolvedColumn,
    ) -> Result<SortKey<'r>> {
        self.key(column.field(row)?, position, column)
    }

    /// Ordering of empty keys relative to non-empty ones, after direction.
    fn empty_placement(&self) -> Ordering {
        match self.empty {
            EmptyHandling::Last => Ordering::Greater,
            _ => Ordering::Less,
        }
    }

    fn compare(&self, a: &SortKey, b: &SortKey) -> Ordering {
        let ord = match (a, b) {
            (SortKey::Empty, SortKey::Empty) => return Ordering::Equal,
            (SortKey::Empty, _) => return self.empty_placement(),
            (_, SortKey::Empty) => return self.empty_placement().reverse(),
            (SortKey::Text(x), SortKey::Text(y)) => x.as_bytes().cmp(y.as_bytes()),
            (SortKey::Number(x), SortKey::Number(y)) => x.cmp(y),
            // Keys of one sort share a data type.
            _ => Ordering::Equal,
        };
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Sort rows by `column` under `policy`.
///
/// Row numbers in errors are 1-based body row positions.
pub fn sort_rows(
    mut rows: Vec<Row>,
    column: &ResolvedColumn,
    policy: &SortKeyPolicy,
) -> Result<Vec<Row>> {
    if rows.len() < 2 {
        // Still validate the single key so bad input fails the same way.
        for (i, row) in rows.iter().enumerate() {
            policy.row_key(row, i + 1, column)?;
        }
        return Ok(rows);
    }

    // Key is (sort key, original index); par_sort_by is stable.
    let mut perm: Vec<usize> = {
        let mut indexed = rows
            .par_iter()
            .enumerate()
            .map(|(i, row)| policy.row_key(row, i + 1, column).map(|key| (key, i)))
            .collect::<Result<Vec<_>>>()?;
        indexed.par_sort_by(|a, b| policy.compare(&a.0, &b.0));
        indexed.into_iter().map(|(_, i)| i).collect()
    };

    // Reorder rows in-place using permutation cycles.
    let n = rows.len();
    for i in 0..n {
        if perm[i] == i {
            continue;
        }
        let mut j = i;
        loop {
            let target = perm[j];
            perm[j] = j;
            if target == i {
                break;
            }
            rows.swap(j, target);
            j = target;
        }
    }

    Ok(rows)
}

/// Sort command configuration.
#[derive(Debug, Clone)]
pub struct SortCommand {
    column: ColumnSymbol,
    pub policy: SortKeyPolicy,
    has_header: bool,
}

impl SortCommand {
    /// Validate the key column up front. Without a header it must be a number.
    pub fn new(column: &str, policy: SortKeyPolicy, has_header: bool) -> Result<Self> {
        let column = ColumnSymbol::parse(column)?
            .ok_or_else(|| CsvError::InvalidOption("--column is required".to_string()))?;
        if !has_header {
            require_index_symbol(&column, "column")?;
        }
        Ok(Self {
            column,
            policy,
            has_header,
        })
    }

    /// Sort a buffered table. The header, if any, is left in place.
    pub fn sort(&self, table: Table) -> Result<Table> {
        let column = self.column.resolve(table.headers.as_deref())?;
        tracing::debug!(
            column = column.label(),
            index = ?column.index(),
            data_type = %self.policy.data_type,
            empty = %self.policy.empty,
            descending = self.policy.descending,
            "sorting rows"
        );
        let rows = sort_rows(table.rows, &column, &self.policy)?;
        Ok(Table::new(table.headers, rows))
    }

    /// Execute the sort: buffer every row, sort, write.
    pub fn run<R: Read, W: Write>(
        &self,
        input: &mut CsvReader<R>,
        output: &mut CsvWriter<W>,
    ) -> Result<()> {
        let table = read_table(input, self.has_header)?;
        let sorted = self.sort(table)?;
        write_table(output, &sorted)?;
        tracing::info!(rows = sorted.len(), "sort finished");
        Ok(())
    }
}
