//! Differential validation of the two parse modes.
//!
//! The fused reducer and the tree parser implement the same reduction by
//! entirely different means, which makes each one an oracle for the other:
//! [`CrossCheck::run`] executes both over the same bytes and compares the
//! summaries. [`CrossCheck::run_against_serde`] adds a third, independent
//! implementation (`serde_json`) as an external reference. A mismatch
//! carries both results and a truncated copy of the input so the failing
//! document can be replayed directly.
//!
//! [`Corpus`] loads vectors of documents with known-good summaries and runs
//! the fused reducer over each of them.

use serde::Deserialize;
use thiserror::Error;

use crate::error::Error as ParseError;
use crate::haversine::{reference_haversine, EARTH_RADIUS_KM};
use crate::json::JsonValue;
use crate::reducer::{parse_and_reduce_coordinates, HaversineSummary};

/// Result type for cross-check operations.
pub type CrossCheckResult<T> = Result<T, CrossCheckError>;

/// Failures of the differential harness itself, as opposed to failures of
/// the parse under test.
#[derive(Debug, Error)]
pub enum CrossCheckError {
    /// The implementation under test rejected the input.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The independent reference implementation rejected the input.
    #[error("reference implementation rejected the input: {0}")]
    Reference(String),
    /// A corpus file could not be decoded.
    #[error("corpus is not valid JSON: {0}")]
    Corpus(String),
}

/// Relative tolerance for comparing two averages of the same pairs.
const AVERAGE_TOLERANCE: f64 = 1e-9;

/// How much of a mismatching input is kept for the repro payload.
const REPRO_INPUT_LIMIT: usize = 256;

/// Reduce an already-parsed document by walking its tree.
///
/// This is the reduction the fused mode must agree with: find the `pairs`
/// array, and for each element that is an object carrying all four numeric
/// coordinate fields, fold its haversine distance into the aggregate.
/// Elements missing a field (or not objects at all) are skipped, not
/// errors.
pub fn reduce_document(document: &JsonValue) -> HaversineSummary {
    let pairs = match document.get("pairs") {
        Some(JsonValue::Array(items)) => items,
        _ => return HaversineSummary::EMPTY,
    };

    let mut sum = 0.0;
    let mut count: u64 = 0;
    for pair in pairs {
        let (Some(x0), Some(y0), Some(x1), Some(y1)) = (
            number_field(pair, "x0"),
            number_field(pair, "y0"),
            number_field(pair, "x1"),
            number_field(pair, "y1"),
        ) else {
            continue;
        };
        sum += reference_haversine(x0, y0, x1, y1, EARTH_RADIUS_KM);
        count += 1;
    }

    HaversineSummary {
        count,
        average_distance: if count > 0 { sum / count as f64 } else { 0.0 },
    }
}

fn number_field(value: &JsonValue, name: &str) -> Option<f64> {
    match value.get(name) {
        Some(JsonValue::Number(n)) => Some(*n),
        _ => None,
    }
}

/// Outcome of one differential run.
#[derive(Debug)]
pub enum CrossCheckOutcome {
    /// Both implementations produced the same summary.
    Match {
        /// The agreed summary.
        summary: HaversineSummary,
    },
    /// The implementations disagreed.
    Mismatch {
        /// Summary from the fused single-pass reducer.
        fused: HaversineSummary,
        /// Summary from the reference reduction.
        reference: HaversineSummary,
        /// Repro payload for debugging.
        repro: Repro,
    },
}

impl CrossCheckOutcome {
    /// Check if the outcome is a match.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// Everything needed to replay a mismatching input.
#[derive(Debug)]
pub struct Repro {
    /// Leading bytes of the input, lossily decoded.
    pub input_prefix: String,
    /// Total input length in bytes.
    pub input_len: usize,
}

impl Repro {
    fn capture(input: &[u8]) -> Self {
        let end = input.len().min(REPRO_INPUT_LIMIT);
        Self {
            input_prefix: String::from_utf8_lossy(&input[..end]).into_owned(),
            input_len: input.len(),
        }
    }
}

/// Differential harness over in-memory input.
pub struct CrossCheck;

impl CrossCheck {
    /// Run the fused reducer and the tree-walk reduction over the same
    /// bytes and compare.
    pub fn run(input: &[u8]) -> CrossCheckResult<CrossCheckOutcome> {
        let fused = parse_and_reduce_coordinates(input)?;
        let tree = reduce_document(&crate::json::parse_document(input)?);
        Ok(Self::compare(input, fused, tree))
    }

    /// Run the fused reducer against a `serde_json` tree walk of the same
    /// bytes, validating this crate against an independent implementation.
    pub fn run_against_serde(input: &[u8]) -> CrossCheckResult<CrossCheckOutcome> {
        let fused = parse_and_reduce_coordinates(input)?;
        let reference = serde_json::from_slice::<serde_json::Value>(input)
            .map(|value| serde_summary(&value))
            .map_err(|err| CrossCheckError::Reference(err.to_string()))?;
        Ok(Self::compare(input, fused, reference))
    }

    fn compare(
        input: &[u8],
        fused: HaversineSummary,
        reference: HaversineSummary,
    ) -> CrossCheckOutcome {
        if summaries_agree(&fused, &reference) {
            CrossCheckOutcome::Match { summary: fused }
        } else {
            CrossCheckOutcome::Mismatch {
                fused,
                reference,
                repro: Repro::capture(input),
            }
        }
    }
}

fn summaries_agree(a: &HaversineSummary, b: &HaversineSummary) -> bool {
    if a.count != b.count {
        return false;
    }
    let scale = a.average_distance.abs().max(b.average_distance.abs());
    (a.average_distance - b.average_distance).abs() <= AVERAGE_TOLERANCE * scale.max(1.0)
}

fn serde_summary(value: &serde_json::Value) -> HaversineSummary {
    let pairs = match value.get("pairs").and_then(|p| p.as_array()) {
        Some(items) => items,
        None => return HaversineSummary::EMPTY,
    };

    let mut sum = 0.0;
    let mut count: u64 = 0;
    for pair in pairs {
        let field = |name: &str| pair.get(name).and_then(|v| v.as_f64());
        let (Some(x0), Some(y0), Some(x1), Some(y1)) =
            (field("x0"), field("y0"), field("x1"), field("y1"))
        else {
            continue;
        };
        sum += reference_haversine(x0, y0, x1, y1, EARTH_RADIUS_KM);
        count += 1;
    }

    HaversineSummary {
        count,
        average_distance: if count > 0 { sum / count as f64 } else { 0.0 },
    }
}

/// A corpus of documents with known-good summaries.
#[derive(Debug, Deserialize)]
pub struct Corpus {
    /// The test vectors.
    pub vectors: Vec<CorpusVector>,
}

/// One corpus entry.
#[derive(Debug, Deserialize)]
pub struct CorpusVector {
    /// Unique identifier for the vector.
    pub id: String,
    /// The document to reduce.
    pub input: String,
    /// The summary the reduction must produce.
    pub expected: HaversineSummary,
}

/// Results from running a corpus.
#[derive(Debug, Default)]
pub struct CorpusResults {
    /// Number of vectors that produced their expected summary.
    pub passed: usize,
    /// Identifiers of vectors that did not, with the actual summary.
    pub failures: Vec<(String, HaversineSummary)>,
}

impl Corpus {
    /// Load a corpus from its JSON representation.
    pub fn from_json(text: &str) -> CrossCheckResult<Self> {
        serde_json::from_str(text).map_err(|err| CrossCheckError::Corpus(err.to_string()))
    }

    /// Run every vector through the fused reducer.
    pub fn run(&self) -> CrossCheckResult<CorpusResults> {
        let mut results = CorpusResults::default();
        for vector in &self.vectors {
            let actual = parse_and_reduce_coordinates(vector.input.as_bytes())?;
            if summaries_agree(&actual, &vector.expected) {
                results.passed += 1;
            } else {
                results.failures.push((vector.id.clone(), actual));
            }
        }
        Ok(results)
    }
}
