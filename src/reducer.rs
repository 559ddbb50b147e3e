//! Fused single-pass parse and reduce.
//!
//! Recognizes exactly the coordinate-pair schema
//! `{ "pairs": [ {"x0": n, "y0": n, "x1": n, "y1": n}, ... ] }` and folds
//! each complete record straight into a running sum and count, without
//! tokens and without a document tree. Working state is one record's worth
//! of slots plus two small scratch buffers, so memory stays constant no
//! matter how many records the input holds.
//!
//! The scan reacts byte-at-a-time: a quoted run is read as a property name
//! and, when followed by `:`, dispatched on the five recognized names;
//! `}` closes the current record, folding it when all four slots are set
//! and skipping it otherwise; everything else advances the cursor. Unknown
//! properties are ignored and their values fall through the scan untouched.

use std::io::Read;

use crate::error::{Error, ParseResult};
use crate::haversine::{reference_haversine, EARTH_RADIUS_KM};
use crate::json::lexer::is_number_byte;
use crate::json::limits::{MAX_NAME_BYTES, MAX_NUMBER_BYTES};
use crate::reader::ByteReader;
use crate::timing::Profiler;

/// Aggregate produced by the fused pass.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HaversineSummary {
    /// Number of complete coordinate pairs folded into the aggregate.
    pub count: u64,
    /// Arithmetic mean of the pairs' haversine distances, 0.0 when empty.
    pub average_distance: f64,
}

impl HaversineSummary {
    /// The summary of an input containing no complete pairs.
    pub const EMPTY: Self = Self {
        count: 0,
        average_distance: 0.0,
    };
}

/// One record's worth of coordinate slots. NaN marks an unset slot.
#[derive(Debug, Clone, Copy)]
struct CoordinatePair {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl CoordinatePair {
    const UNSET: Self = Self {
        x0: f64::NAN,
        y0: f64::NAN,
        x1: f64::NAN,
        y1: f64::NAN,
    };

    fn is_complete(&self) -> bool {
        !self.x0.is_nan() && !self.y0.is_nan() && !self.x1.is_nan() && !self.y1.is_nan()
    }
}

/// Parse the coordinate-pair document and reduce it in one pass.
pub fn parse_and_reduce_coordinates<R: Read>(input: R) -> ParseResult<HaversineSummary> {
    let profiler = Profiler::new();
    parse_and_reduce_coordinates_profiled(input, &profiler)
}

/// Fused parse and reduce, attributing time to zones of the given profiler.
pub fn parse_and_reduce_coordinates_profiled<R: Read>(
    input: R,
    profiler: &Profiler,
) -> ParseResult<HaversineSummary> {
    let _zone = profiler.begin_zone("reduce");

    let mut reader = ByteReader::new(input);
    let mut pair = CoordinatePair::UNSET;
    let mut sum = 0.0;
    let mut count: u64 = 0;

    while let Some(byte) = reader.advance()? {
        match byte {
            b'"' => {
                let mut name = [0u8; MAX_NAME_BYTES];
                let len = read_quoted_name(&mut reader, &mut name)?;

                skip_whitespace(&mut reader)?;
                if reader.peek()? != Some(b':') {
                    // A quoted value, not a property name; nothing to do.
                    continue;
                }
                reader.advance()?;
                skip_whitespace(&mut reader)?;

                match &name[..len] {
                    b"pairs" => expect_byte(&mut reader, b'[')?,
                    b"x0" => pair.x0 = read_numeric(&mut reader)?,
                    b"y0" => pair.y0 = read_numeric(&mut reader)?,
                    b"x1" => pair.x1 = read_numeric(&mut reader)?,
                    b"y1" => pair.y1 = read_numeric(&mut reader)?,
                    // Unknown property: its value is skipped by the scan.
                    _ => {}
                }
            }
            b'}' => {
                if pair.is_complete() {
                    let distance = {
                        let _zone = profiler.begin_zone("haversine");
                        reference_haversine(pair.x0, pair.y0, pair.x1, pair.y1, EARTH_RADIUS_KM)
                    };
                    sum += distance;
                    count += 1;
                }
                pair = CoordinatePair::UNSET;
            }
            // Structural bytes, whitespace, and skipped values.
            _ => {}
        }
    }

    Ok(HaversineSummary {
        count,
        average_distance: if count > 0 { sum / count as f64 } else { 0.0 },
    })
}

/// Read a quoted run into the fixed name buffer, returning its length.
///
/// An escaped byte is stored verbatim; escaped names never match any of the
/// recognized plain names, which is all the reducer needs.
fn read_quoted_name<R: Read>(
    reader: &mut ByteReader<R>,
    name: &mut [u8; MAX_NAME_BYTES],
) -> ParseResult<usize> {
    let mut len = 0;
    loop {
        let byte = reader.advance()?.ok_or(Error::UnexpectedEof {
            context: "in property name",
        })?;
        let stored = match byte {
            b'"' => return Ok(len),
            b'\\' => reader.advance()?.ok_or(Error::UnexpectedEof {
                context: "in property name escape",
            })?,
            other => other,
        };
        if len >= MAX_NAME_BYTES {
            return Err(Error::BufferOverflow {
                what: "property name",
                capacity: MAX_NAME_BYTES,
            });
        }
        name[len] = stored;
        len += 1;
    }
}

/// Read a bounded numeric literal and parse it as `f64`, with the same
/// character set and grammar as the tokenizer.
fn read_numeric<R: Read>(reader: &mut ByteReader<R>) -> ParseResult<f64> {
    let mut buf = [0u8; MAX_NUMBER_BYTES];
    let mut len = 0;

    while let Some(b) = reader.peek()? {
        if !is_number_byte(b) {
            break;
        }
        if len >= MAX_NUMBER_BYTES {
            return Err(Error::BufferOverflow {
                what: "number literal",
                capacity: MAX_NUMBER_BYTES,
            });
        }
        buf[len] = b;
        len += 1;
        reader.advance()?;
    }

    if len == 0 {
        return Err(Error::UnexpectedToken {
            expected: "number",
            found: describe_peek(reader)?,
        });
    }

    let text = std::str::from_utf8(&buf[..len])
        .map_err(|_| Error::MalformedNumber(String::from_utf8_lossy(&buf[..len]).into_owned()))?;
    text.parse()
        .map_err(|_| Error::MalformedNumber(text.to_owned()))
}

/// Skip whitespace characters.
fn skip_whitespace<R: Read>(reader: &mut ByteReader<R>) -> ParseResult<()> {
    while let Some(b) = reader.peek()? {
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => {
                reader.advance()?;
            }
            _ => break,
        }
    }
    Ok(())
}

/// Require one specific byte at the cursor.
fn expect_byte<R: Read>(reader: &mut ByteReader<R>, expected: u8) -> ParseResult<()> {
    match reader.advance()? {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(Error::UnexpectedToken {
            expected: match expected {
                b'[' => "'['",
                _ => "punctuation",
            },
            found: format!("'{}'", actual as char),
        }),
        None => Err(Error::UnexpectedEof {
            context: "after property name",
        }),
    }
}

fn describe_peek<R: Read>(reader: &mut ByteReader<R>) -> ParseResult<String> {
    Ok(match reader.peek()? {
        Some(b) => format!("'{}'", b as char),
        None => "end of input".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn reduce(input: &str) -> ParseResult<HaversineSummary> {
        parse_and_reduce_coordinates(input.as_bytes())
    }

    #[test]
    fn test_single_pair() {
        let summary = reduce(r#"{"pairs":[{"x0":0,"y0":0,"x1":0,"y1":1}]}"#).unwrap();
        assert_eq!(summary.count, 1);
        assert!(
            (summary.average_distance - 111.2).abs() < 0.1,
            "expected ~111.2 km, got {}",
            summary.average_distance
        );
    }

    #[test]
    fn test_empty_pairs_array() {
        let summary = reduce(r#"{"pairs":[]}"#).unwrap();
        assert_eq!(summary, HaversineSummary::EMPTY);
    }

    #[test]
    fn test_field_order_is_irrelevant() {
        let a = reduce(r#"{"pairs":[{"x0":10,"y0":20,"x1":30,"y1":40}]}"#).unwrap();
        let b = reduce(r#"{"pairs":[{"y1":40,"x1":30,"y0":20,"x0":10}]}"#).unwrap();
        assert_eq!(a.count, b.count);
        assert!((a.average_distance - b.average_distance).abs() < 1e-12);
    }

    #[test]
    fn test_incomplete_pair_is_skipped() {
        let summary = reduce(
            r#"{"pairs":[{"x0":0,"y0":0,"x1":0},{"x0":0,"y0":0,"x1":0,"y1":1}]}"#,
        )
        .unwrap();
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn test_unknown_properties_are_ignored() {
        let summary = reduce(
            r#"{"pairs":[{"x0":0,"tag":7,"y0":0,"x1":0,"y1":1,"note":"ok"}]}"#,
        )
        .unwrap();
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn test_whitespace_and_formatting() {
        let summary = reduce(
            "{\n  \"pairs\": [\n    { \"x0\": 0, \"y0\": 0, \"x1\": 0, \"y1\": 1 }\n  ]\n}",
        )
        .unwrap();
        assert_eq!(summary.count, 1);
    }

    #[test]
    fn test_long_property_name_overflows() {
        let err = reduce(r#"{"pairs":[{"averylongpropertyname":1}]}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferOverflow);
    }

    #[test]
    fn test_pairs_must_open_an_array() {
        let err = reduce(r#"{"pairs":{}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("'['"));
    }

    #[test]
    fn test_non_numeric_coordinate_fails() {
        let err = reduce(r#"{"pairs":[{"x0":null}]}"#).unwrap_err();
        assert!(err.to_string().contains("expected number"));
    }

    #[test]
    fn test_negative_and_exponent_coordinates() {
        let summary =
            reduce(r#"{"pairs":[{"x0":-1.5e1,"y0":2.5,"x1":-15,"y1":2.5}]}"#).unwrap();
        assert_eq!(summary.count, 1);
        // Identical points, distance 0.
        assert_eq!(summary.average_distance, 0.0);
    }

    #[test]
    fn test_many_pairs_average() {
        // Two pairs of identical points: average must stay 0.
        let summary = reduce(
            r#"{"pairs":[{"x0":1,"y0":1,"x1":1,"y1":1},{"x0":2,"y0":2,"x1":2,"y1":2}]}"#,
        )
        .unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_distance, 0.0);
    }

    #[test]
    fn test_profiled_reduce_records_zones() {
        let profiler = Profiler::new();
        let summary = parse_and_reduce_coordinates_profiled(
            &br#"{"pairs":[{"x0":0,"y0":0,"x1":0,"y1":1}]}"#[..],
            &profiler,
        )
        .unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(profiler.zone_stats("reduce").unwrap().hit_count, 1);
        assert_eq!(profiler.zone_stats("haversine").unwrap().hit_count, 1);
    }
}
