//! Column symbols and their resolution against a header row.
//!
//! A symbol made only of ASCII digits selects a column by zero-based position;
//! any other symbol selects the first header field with exactly that text.
//! The distinction is made once, when the symbol is parsed.

use crate::table::{CsvError, Result, Row};
use rustc_hash::FxHashSet;
use std::fmt;
use std::str::FromStr;

/// A parsed, not yet resolved, column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnSymbol {
    Index(usize),
    Name(String),
}

impl ColumnSymbol {
    /// Parse user input. The empty string means "no column" and yields `None`.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        if text.is_empty() {
            return Ok(None);
        }
        if text.bytes().all(|b| b.is_ascii_digit()) {
            let index = text.parse().map_err(|_| {
                CsvError::InvalidOption(format!("column number {text} is too large"))
            })?;
            return Ok(Some(Self::Index(index)));
        }
        Ok(Some(Self::Name(text.to_string())))
    }

    /// Resolve against an optional header row.
    ///
    /// Indices are taken as-is, with no bounds check; names need a header and
    /// must match a header field exactly.
    pub fn resolve(&self, header: Option<&[String]>) -> Result<ResolvedColumn> {
        let index = match self {
            Self::Index(index) => *index,
            Self::Name(name) => {
                let header = header.ok_or_else(|| CsvError::NotNumberSymbol(name.clone()))?;
                header
                    .iter()
                    .position(|field| field == name)
                    .ok_or_else(|| CsvError::ColumnNotFound(name.clone()))?
            }
        };
        let label = header.and_then(|h| h.get(index)).cloned();

        Ok(ResolvedColumn {
            symbol: self.to_string(),
            index: Some(index),
            label,
        })
    }
}

impl FromStr for ColumnSymbol {
    type Err = CsvError;

    /// Like [`ColumnSymbol::parse`], but an empty symbol is an error.
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)?.ok_or_else(|| CsvError::InvalidOption("empty column symbol".to_string()))
    }
}

impl fmt::Display for ColumnSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A column symbol bound to a concrete index for the rest of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    symbol: String,
    index: Option<usize>,
    label: Option<String>,
}

impl ResolvedColumn {
    /// A column that is not targeted at all.
    pub fn unresolved(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            index: None,
            label: None,
        }
    }

    /// The symbol as the user gave it.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_resolved(&self) -> bool {
        self.index.is_some()
    }

    /// Header text at the resolved index, falling back to the symbol.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.symbol)
    }

    /// Borrow this column's field from a row.
    ///
    /// This is where an out-of-range index surfaces.
    pub fn field<'r>(&self, row: &'r [String]) -> Result<&'r str> {
        let index = self
            .index
            .ok_or_else(|| CsvError::Unresolved(self.symbol.clone()))?;
        row.get(index)
            .map(String::as_str)
            .ok_or_else(|| CsvError::ColumnOutOfRange {
                symbol: self.symbol.clone(),
                index,
                width: row.len(),
            })
    }
}

/// Resolve raw user text. An empty symbol gives an unresolved column.
pub fn resolve(symbol: &str, header: Option<&[String]>) -> Result<ResolvedColumn> {
    match ColumnSymbol::parse(symbol)? {
        Some(parsed) => parsed.resolve(header),
        None => Ok(ResolvedColumn::unresolved(symbol)),
    }
}

/// Reject header-name symbols for a flag when the input has no header.
///
/// The error names the flag so each command words it after its own option.
pub fn require_index_symbol(symbol: &ColumnSymbol, flag: &str) -> Result<()> {
    match symbol {
        ColumnSymbol::Index(_) => Ok(()),
        ColumnSymbol::Name(name) => Err(CsvError::InvalidOption(format!(
            "--{flag} must be a column number when the input has no header (got {name:?})"
        ))),
    }
}

/// Ordered resolved columns with no repeated index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<ResolvedColumn>,
    seen: FxHashSet<usize>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every symbol, stopping at the first failure, then drop repeated
    /// indices keeping the first occurrence.
    pub fn resolve(symbols: &[ColumnSymbol], header: Option<&[String]>) -> Result<Self> {
        let mut set = Self::new();
        for symbol in symbols {
            set.push(symbol.resolve(header)?);
        }
        Ok(set)
    }

    /// Every column of a row of `width` fields, in order.
    pub fn all(width: usize, header: Option<&[String]>) -> Self {
        let mut set = Self::new();
        for index in 0..width {
            set.push(ResolvedColumn {
                symbol: index.to_string(),
                index: Some(index),
                label: header.and_then(|h| h.get(index)).cloned(),
            });
        }
        set
    }

    /// Add a column unless its index is already present or it is unresolved.
    /// Returns whether it was added.
    pub fn push(&mut self, column: ResolvedColumn) -> bool {
        let Some(index) = column.index else {
            return false;
        };
        if !self.seen.insert(index) {
            return false;
        }
        self.columns.push(column);
        true
    }

    pub fn contains_index(&self, index: usize) -> bool {
        self.seen.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedColumn> {
        self.columns.iter()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.columns.iter().filter_map(|c| c.index).collect()
    }

    /// Copy this set's fields out of a row, in set order.
    pub fn select(&self, row: &[String]) -> Result<Row> {
        self.columns
            .iter()
            .map(|c| c.field(row).map(str::to_owned))
            .collect()
    }

    /// Borrow this set's fields out of a row, in set order.
    pub fn key<'r>(&self, row: &'r [String]) -> Result<Vec<&'r str>> {
        self.columns.iter().map(|c| c.field(row)).collect()
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a ResolvedColumn;
    type IntoIter = std::slice::Iter<'a, ResolvedColumn>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// Resolve raw user symbols into a de-duplicated set. Empty symbols are skipped.
pub fn resolve_set<S: AsRef<str>>(symbols: &[S], header: Option<&[String]>) -> Result<ColumnSet> {
    let mut parsed = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        parsed.extend(ColumnSymbol::parse(symbol.as_ref())?);
    }
    ColumnSet::resolve(&parsed, header)
}
