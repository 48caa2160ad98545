//! csvops: encoding-aware CSV transformation toolkit
//!
//! This library provides the core of a CSV transformation utility.
//!
//! # Features
//!
//! - **Encoding gateway**: UTF-8 (with BOM detection), Shift_JIS and EUC-JP
//!   input and output
//! - **Column resolution**: columns named by header text or by position
//! - **Staged streaming**: one pass, one row in memory, header / pre-body /
//!   record stages supplied by each command
//! - **Sorting**: text or number keys with explicit empty-value placement,
//!   parallelized with Rayon
//!
//! # Example
//!
//! ```rust,no_run
//! use csvops::commands::{SortCommand, SortKeyPolicy};
//! use csvops::streaming::{CsvReader, CsvWriter, InputEncoding, OutputEncoding};
//!
//! let mut input = CsvReader::from_path("people.csv", InputEncoding::ShiftJis).unwrap();
//! let mut output = CsvWriter::new(std::io::stdout(), OutputEncoding::Utf8, false).unwrap();
//!
//! let cmd = SortCommand::new("age", SortKeyPolicy::default(), true).unwrap();
//! cmd.run(&mut input, &mut output).unwrap();
//! ```

pub mod column;
pub mod commands;
pub mod config;
pub mod logging;
pub mod streaming;
pub mod table;

// Re-export commonly used types
pub use column::{resolve, resolve_set, ColumnSet, ColumnSymbol, ResolvedColumn};
pub use config::IoOptions;
pub use table::{read_table, write_table, CsvError, Result, Row, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::column::{ColumnSet, ColumnSymbol, ResolvedColumn};
    pub use crate::commands::{
        CatCommand, FilterCommand, HeadersCommand, SelectCommand, SortCommand, SortKeyPolicy,
        UniqCommand,
    };
    pub use crate::config::IoOptions;
    pub use crate::streaming::{
        CsvReader, CsvWriter, InputEncoding, OutputEncoding, RecordProcessor, RecordStages,
    };
    pub use crate::table::{CsvError, Result, Row, Table};
}
