//! Buffer size constants for streaming operations.

/// Default output buffer size for the CSV writer (256 KB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 256 * 1024;

/// Default input buffer size for the CSV tokenizer (64 KB).
pub const DEFAULT_INPUT_BUFFER: usize = 64 * 1024;

/// Raw bytes read per decode step for non-UTF-8 input (16 KB).
/// The UTF-8 output buffer is twice this size.
pub const DECODE_CHUNK: usize = 16 * 1024;

/// Scratch space for encoding UTF-8 into the output encoding (16 KB).
pub const ENCODE_CHUNK: usize = 16 * 1024;
