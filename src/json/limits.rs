//! Fixed scratch-buffer capacities for tokenization and reduction.
//!
//! The lexer and the fused reducer accumulate literals into stack arrays of
//! these sizes. The capacities are deliberate ceilings: exceeding one is a
//! distinct [`crate::ErrorKind::BufferOverflow`] failure, never a silent
//! truncation, so callers raising input-size limits do so deliberately.
//! They are compile-time constants because the buffers are `[u8; N]`
//! scratch space; keeping the per-token hot path free of heap allocation
//! is what lets the streaming pass sustain its throughput.

/// Maximum decoded length of a string literal in bytes.
pub const MAX_STRING_BYTES: usize = 4096;

/// Maximum length of a numeric literal in bytes.
pub const MAX_NUMBER_BYTES: usize = 64;

/// Maximum length of a property name recognized by the fused reducer.
///
/// The reducer only needs to distinguish `pairs`, `x0`, `y0`, `x1`, and
/// `y1`; a longer quoted name in its input is a fatal overflow.
pub const MAX_NAME_BYTES: usize = 16;
