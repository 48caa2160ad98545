//! Command implementations for csvops.

pub mod cat;
pub mod filter;
pub mod headers;
pub mod select;
pub mod sort;
pub mod uniq;

pub use cat::{CatCommand, PassThrough};
pub use filter::{FilterCommand, FilterStages};
pub use headers::HeadersCommand;
pub use select::{SelectCommand, SelectStages};
pub use sort::{sort_rows, DataType, EmptyHandling, SortCommand, SortKeyPolicy};
pub use uniq::UniqCommand;
