//! Recursive descent JSON parser (tree mode).
//!
//! Consumes the token stream with single-token lookahead and builds a
//! [`JsonValue`]. Any structural mismatch names the expected and actual
//! tokens; trailing data after the top-level value is fatal. A key
//! repeated within one object overwrites the earlier value (last write
//! wins), the common JSON behavior for this order-dependent case.

use std::collections::BTreeMap;
use std::io::Read;

use crate::error::{Error, ParseResult};
use crate::timing::Profiler;

use super::lexer::{Token, Tokenizer};
use super::types::JsonValue;

/// Tree-mode JSON parser.
pub struct JsonParser<'p, R> {
    tokenizer: Tokenizer<'p, R>,
    current: Token,
}

impl<'p, R: Read> JsonParser<'p, R> {
    /// Create a parser over the given input stream.
    pub fn new(input: R, profiler: &'p Profiler) -> ParseResult<Self> {
        let mut tokenizer = Tokenizer::new(input, profiler);
        let current = tokenizer.next_token()?;
        Ok(Self { tokenizer, current })
    }

    /// Parse the input into a single document value.
    pub fn parse(mut self) -> ParseResult<JsonValue> {
        let value = self.parse_value()?;

        if self.current != Token::Eof {
            return Err(Error::TrailingData);
        }

        Ok(value)
    }

    /// Advance to the next token.
    fn advance(&mut self) -> ParseResult<()> {
        self.current = self.tokenizer.next_token()?;
        Ok(())
    }

    /// Parse a single JSON value, dispatching on the current token's kind.
    fn parse_value(&mut self) -> ParseResult<JsonValue> {
        match &self.current {
            Token::Null => {
                self.advance()?;
                Ok(JsonValue::Null)
            }
            Token::True => {
                self.advance()?;
                Ok(JsonValue::Bool(true))
            }
            Token::False => {
                self.advance()?;
                Ok(JsonValue::Bool(false))
            }
            Token::String(s) => {
                let value = JsonValue::String(s.clone());
                self.advance()?;
                Ok(value)
            }
            Token::Number(n) => {
                let value = JsonValue::Number(*n);
                self.advance()?;
                Ok(value)
            }
            Token::LeftBrace => self.parse_object(),
            Token::LeftBracket => self.parse_array(),
            Token::Eof => Err(Error::UnexpectedEof {
                context: "while parsing a value",
            }),
            other => Err(Error::UnexpectedToken {
                expected: "a value",
                found: other.kind_name().to_string(),
            }),
        }
    }

    /// Parse a JSON object.
    fn parse_object(&mut self) -> ParseResult<JsonValue> {
        // Consume opening brace
        self.advance()?;

        let mut map = BTreeMap::new();

        // Empty object
        if self.current == Token::RightBrace {
            self.advance()?;
            return Ok(JsonValue::Object(map));
        }

        loop {
            // Expect string key
            let key = match &self.current {
                Token::String(s) => s.clone(),
                Token::Eof => {
                    return Err(Error::UnexpectedEof {
                        context: "inside object",
                    })
                }
                other => {
                    return Err(Error::UnexpectedToken {
                        expected: "string key",
                        found: other.kind_name().to_string(),
                    })
                }
            };
            self.advance()?;

            self.expect(Token::Colon)?;

            // A repeated key overwrites the earlier value.
            let value = self.parse_value()?;
            map.insert(key, value);

            match &self.current {
                Token::Comma => {
                    self.advance()?;
                    // Trailing comma is not allowed in JSON
                    if self.current == Token::RightBrace {
                        return Err(Error::UnexpectedToken {
                            expected: "string key",
                            found: self.current.kind_name().to_string(),
                        });
                    }
                }
                Token::RightBrace => {
                    self.advance()?;
                    break;
                }
                Token::Eof => {
                    return Err(Error::UnexpectedEof {
                        context: "inside object",
                    })
                }
                other => {
                    return Err(Error::UnexpectedToken {
                        expected: "',' or '}'",
                        found: other.kind_name().to_string(),
                    })
                }
            }
        }

        Ok(JsonValue::Object(map))
    }

    /// Parse a JSON array.
    fn parse_array(&mut self) -> ParseResult<JsonValue> {
        // Consume opening bracket
        self.advance()?;

        let mut items = Vec::new();

        // Empty array
        if self.current == Token::RightBracket {
            self.advance()?;
            return Ok(JsonValue::Array(items));
        }

        loop {
            let value = self.parse_value()?;
            items.push(value);

            match &self.current {
                Token::Comma => {
                    self.advance()?;
                    // Trailing comma is not allowed in JSON
                    if self.current == Token::RightBracket {
                        return Err(Error::UnexpectedToken {
                            expected: "a value",
                            found: self.current.kind_name().to_string(),
                        });
                    }
                }
                Token::RightBracket => {
                    self.advance()?;
                    break;
                }
                Token::Eof => {
                    return Err(Error::UnexpectedEof {
                        context: "inside array",
                    })
                }
                other => {
                    return Err(Error::UnexpectedToken {
                        expected: "',' or ']'",
                        found: other.kind_name().to_string(),
                    })
                }
            }
        }

        Ok(JsonValue::Array(items))
    }

    /// Require a specific structural token and consume it.
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current != expected {
            return Err(Error::UnexpectedToken {
                expected: expected.kind_name(),
                found: self.current.kind_name().to_string(),
            });
        }
        self.advance()
    }
}

/// Parse a complete JSON document from a stream.
pub fn parse_document<R: Read>(input: R) -> ParseResult<JsonValue> {
    let profiler = Profiler::new();
    parse_document_profiled(input, &profiler)
}

/// Parse a complete JSON document, attributing time to zones of the given
/// profiler.
pub fn parse_document_profiled<R: Read>(input: R, profiler: &Profiler) -> ParseResult<JsonValue> {
    let _zone = profiler.begin_zone("json.parse");
    JsonParser::new(input, profiler)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(input: &str) -> ParseResult<JsonValue> {
        parse_document(input.as_bytes())
    }

    #[test]
    fn test_parse_null() {
        assert_eq!(parse("null").unwrap(), JsonValue::Null);
    }

    #[test]
    fn test_parse_booleans() {
        assert_eq!(parse("true").unwrap(), JsonValue::Bool(true));
        assert_eq!(parse("false").unwrap(), JsonValue::Bool(false));
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse("42").unwrap(), JsonValue::Number(42.0));
        assert_eq!(parse("-123.25").unwrap(), JsonValue::Number(-123.25));
        assert_eq!(parse("1e3").unwrap(), JsonValue::Number(1000.0));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse(r#""hello""#).unwrap(),
            JsonValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_parse_array() {
        let result = parse("[1, 2, 3]").unwrap();
        assert_eq!(
            result,
            JsonValue::Array(vec![
                JsonValue::Number(1.0),
                JsonValue::Number(2.0),
                JsonValue::Number(3.0),
            ])
        );
    }

    #[test]
    fn test_parse_object() {
        let result = parse(r#"{"a": 1, "b": 2}"#).unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), JsonValue::Number(1.0));
        expected.insert("b".to_string(), JsonValue::Number(2.0));
        assert_eq!(result, JsonValue::Object(expected));
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let result = parse(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(result.get("a"), Some(&JsonValue::Number(2.0)));
    }

    #[test]
    fn test_missing_colon() {
        let err = parse(r#"{"a" 1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("':'"));
    }

    #[test]
    fn test_non_string_key() {
        let err = parse("{1: 2}").unwrap_err();
        assert!(err.to_string().contains("string key"));
    }

    #[test]
    fn test_trailing_content_rejected() {
        let err = parse("null extra").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
        let err = parse("null 1").unwrap_err();
        assert!(matches!(err, Error::TrailingData));
    }

    #[test]
    fn test_trailing_comma_rejected() {
        assert!(parse("[1, 2,]").is_err());
        assert!(parse(r#"{"a": 1,}"#).is_err());
    }

    #[test]
    fn test_dangling_brace_mentions_end_of_input() {
        let err = parse("{").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lexical);
        assert!(err.to_string().contains("unexpected end of input"));

        let err = parse(r#"{"pairs": ["#).unwrap_err();
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn test_nested_structure() {
        let result = parse(r#"{"arr": [1, {"nested": true}], "num": 42}"#).unwrap();
        assert!(result.is_object());
        let arr = result.get("arr").unwrap();
        assert!(arr.is_array());
        assert_eq!(
            arr.get_index(1).unwrap().get("nested"),
            Some(&JsonValue::Bool(true))
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(parse("[]").unwrap(), JsonValue::Array(vec![]));
        assert_eq!(parse("{}").unwrap(), JsonValue::Object(BTreeMap::new()));
    }
}
