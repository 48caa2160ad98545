//! Per-invocation I/O configuration.
//!
//! Built once from command-line values and validated before any stream is
//! opened, then never mutated. Column resolution results are kept out of
//! here; they live with the stages of the stream that produced them.

use crate::column::ColumnSymbol;
use crate::streaming::{CsvReader, CsvWriter, InputEncoding, OutputEncoding};
use crate::table::Result;
use std::io::{Read, Write};

/// Stream settings shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoOptions {
    pub input_encoding: InputEncoding,
    /// Explicit output encoding; `None` follows the input encoding.
    pub output_encoding: Option<OutputEncoding>,
    pub has_header: bool,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            input_encoding: InputEncoding::Utf8,
            output_encoding: None,
            has_header: true,
        }
    }
}

impl IoOptions {
    /// Parse encoding names as given on the command line.
    ///
    /// Unsupported names fail here, before any I/O.
    pub fn new(
        input_encoding: &str,
        output_encoding: Option<&str>,
        has_header: bool,
    ) -> Result<Self> {
        Ok(Self {
            input_encoding: input_encoding.parse()?,
            output_encoding: output_encoding.map(str::parse).transpose()?,
            has_header,
        })
    }

    /// The encoding rows are written in.
    pub fn effective_output_encoding(&self) -> OutputEncoding {
        self.output_encoding
            .unwrap_or_else(|| OutputEncoding::from(self.input_encoding))
    }

    /// Whether the output should start with a BOM.
    ///
    /// An explicit `utf8bom` always writes one. Otherwise the input's BOM is
    /// preserved only when the output encoding was not overridden.
    pub fn output_bom(&self, bom_detected: bool) -> bool {
        match self.output_encoding {
            Some(encoding) => encoding == OutputEncoding::Utf8Bom,
            None => bom_detected && self.input_encoding == InputEncoding::Utf8,
        }
    }

    /// Open a CSV reader over `input` in the configured input encoding.
    pub fn open_reader<R: Read>(&self, input: R) -> Result<CsvReader<R>> {
        CsvReader::new(input, self.input_encoding)
    }

    /// Open a CSV writer over `output`, applying the BOM policy.
    pub fn open_writer<W: Write>(&self, output: W, bom_detected: bool) -> Result<CsvWriter<W>> {
        let encoding = self.effective_output_encoding();
        let bom = self.output_bom(bom_detected);
        tracing::debug!(%encoding, bom, "opening output");
        CsvWriter::new(output, encoding, bom)
    }
}

/// Split a colon-separated list of column symbols, e.g. `name:2:city`.
///
/// Empty entries are dropped.
pub fn parse_symbol_list(spec: &str) -> Result<Vec<ColumnSymbol>> {
    let mut symbols = Vec::new();
    for part in spec.split(':') {
        if let Some(symbol) = ColumnSymbol::parse(part)? {
            symbols.push(symbol);
        }
    }
    Ok(symbols)
}
