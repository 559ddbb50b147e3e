//! Micro-benchmarking harness pairing a streaming coordinate-pair JSON
//! parser with a cycle-accurate zone profiler.
//!
//! # Architecture
//!
//! The implementation is organized into modules, leaf-first:
//!
//! - [`timing`] - Cycle counter, frequency calibration, zone profiler
//! - [`reader`] - Buffered single-byte cursor over any input stream
//! - [`json`] - Tokenizer, document values, recursive descent tree parser
//! - [`reducer`] - Fused single-pass parse and reduce with constant memory
//! - [`haversine`] - The great-circle distance the reduction folds with
//! - [`crosscheck`] - Differential validation of the two parse modes
//! - [`error`] - The crate-wide error enum and its classification
//!
//! # Usage
//!
//! Tree mode materializes a document:
//!
//! ```
//! use haversine_harness::parse_document;
//!
//! let document = parse_document(&br#"{"pairs": []}"#[..]).unwrap();
//! assert!(document.get("pairs").unwrap().is_array());
//! ```
//!
//! Fused mode reduces the stream directly, holding one record's worth of
//! state no matter how large the input is:
//!
//! ```
//! use haversine_harness::{parse_and_reduce_coordinates_profiled, Profiler};
//!
//! let input = &br#"{"pairs":[{"x0":0,"y0":0,"x1":0,"y1":1}]}"#[..];
//! let profiler = Profiler::new();
//! let summary = parse_and_reduce_coordinates_profiled(input, &profiler).unwrap();
//! assert_eq!(summary.count, 1);
//! // profiler.print_results(input.len() as u64);
//! ```

// Library code propagates errors; unwrap/expect/panic are confined to tests.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod crosscheck;
pub mod error;
pub mod haversine;
pub mod json;
pub mod reader;
pub mod reducer;
pub mod timing;

// Re-export commonly used types
pub use error::{Error, ErrorKind, ParseResult};
pub use json::{parse_document, parse_document_profiled, JsonValue};
pub use reducer::{
    parse_and_reduce_coordinates, parse_and_reduce_coordinates_profiled, HaversineSummary,
};
pub use timing::{estimate_frequency, read_cycle_counter, Profiler, ZoneGuard};
