//! Centralized streaming utilities for csvops.
//!
//! This module provides shared components for all commands:
//! - Encoding-aware byte streams (BOM detection, Shift_JIS / EUC-JP transcoding)
//! - Row-level CSV reader and writer on top of those streams
//! - The staged single-pass record processor
//!
//! Streaming commands hold one row at a time.

pub mod buffers;
pub mod encoding;
pub mod input;
pub mod output;
pub mod processor;

pub use encoding::{DecodingReader, EncodingWriter, InputEncoding, OutputEncoding, UTF8_BOM};
pub use input::{CsvReader, RowIter};
pub use output::CsvWriter;
pub use processor::{ProcessStats, RecordProcessor, RecordStages};
