//! Streaming JSON parsing.
//!
//! The JSON subsystem is organized into focused modules:
//!
//! - [`types`] - The document value union
//! - [`limits`] - Fixed scratch-buffer capacities
//! - [`lexer`] - Streaming tokenizer
//! - [`parser`] - Recursive descent tree parser
//!
//! Tree mode materializes a [`JsonValue`]; the fused single-pass mode that
//! skips the tree entirely lives in [`crate::reducer`].
//!
//! # Example
//!
//! ```
//! use haversine_harness::json::parse_document;
//!
//! let document = parse_document(&br#"{"pairs": []}"#[..]).unwrap();
//! assert!(document.get("pairs").unwrap().is_array());
//! ```

pub mod lexer;
pub mod limits;
pub mod parser;
pub mod types;

// Re-export commonly used items
pub use lexer::{Token, Tokenizer};
pub use parser::{parse_document, parse_document_profiled, JsonParser};
pub use types::JsonValue;
