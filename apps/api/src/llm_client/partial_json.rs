//! Tolerant decoding of JSON that may be cut off at any point.
//!
//! Streaming tool calls deliver their input as raw JSON fragments. To surface a
//! progressively-filled object we re-decode the accumulated buffer after every
//! fragment: open containers are closed implicitly, a trailing string value is
//! kept as the prefix received so far, and anything still ambiguous (a half
//! key, a literal like `tru`, a number that may have more digits coming) is
//! left out until more text arrives. Text that can never become valid JSON is
//! reported as [`MalformedJson`].

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed JSON near offset {offset}")]
pub struct MalformedJson {
    pub offset: usize,
}

/// Decodes a possibly-truncated JSON document.
///
/// `Ok(None)` means nothing usable has arrived yet.
pub fn parse_partial_json(input: &str) -> Result<Option<Value>, MalformedJson> {
    let mut parser = PartialParser {
        chars: input.chars().collect(),
        pos: 0,
        malformed: false,
    };
    let value = parser.value();
    if parser.malformed {
        return Err(MalformedJson { offset: parser.pos });
    }
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(MalformedJson { offset: parser.pos });
    }
    Ok(value)
}

/// Accumulates fragments and yields the decoded object each time it changes.
#[derive(Debug, Default)]
pub struct PartialObjectDecoder {
    buffer: String,
    last: Option<Value>,
}

impl PartialObjectDecoder {
    pub fn push(&mut self, fragment: &str) -> Result<Option<Value>, MalformedJson> {
        self.buffer.push_str(fragment);
        let Some(value) = parse_partial_json(&self.buffer)? else {
            return Ok(None);
        };
        if self.last.as_ref() == Some(&value) {
            return Ok(None);
        }
        self.last = Some(value.clone());
        Ok(Some(value))
    }

    /// Strictly decodes the full buffer once the producer says it is done.
    /// Returns the final value only if it differs from the last one yielded.
    pub fn finish(&mut self) -> Result<Option<Value>, serde_json::Error> {
        let value: Value = serde_json::from_str(&self.buffer)?;
        if self.last.as_ref() == Some(&value) {
            return Ok(None);
        }
        self.last = Some(value.clone());
        Ok(Some(value))
    }
}

struct PartialParser {
    chars: Vec<char>,
    pos: usize,
    malformed: bool,
}

impl PartialParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn fail(&mut self) -> Option<Value> {
        self.malformed = true;
        None
    }

    /// `None` means incomplete (input exhausted) or malformed (flag set).
    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '{' => self.object(),
            '[' => self.array(),
            '"' => self.string().map(|(s, _)| Value::String(s)),
            't' => self.literal("true", Value::Bool(true)),
            'f' => self.literal("false", Value::Bool(false)),
            'n' => self.literal("null", Value::Null),
            c if c == '-' || c.is_ascii_digit() => self.number(),
            _ => self.fail(),
        }
    }

    fn object(&mut self) -> Option<Value> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some('"') => {}
                Some(_) => return self.fail(),
            }

            let Some((key, complete)) = self.string() else {
                break;
            };
            if !complete {
                break;
            }

            self.skip_ws();
            match self.peek() {
                None => break,
                Some(':') => self.pos += 1,
                Some(_) => return self.fail(),
            }

            match self.value() {
                Some(v) => {
                    map.insert(key, v);
                }
                None if self.malformed => return None,
                None => break,
            }

            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return self.fail(),
            }
        }
        Some(Value::Object(map))
    }

    fn array(&mut self) -> Option<Value> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {}
            }

            match self.value() {
                Some(v) => items.push(v),
                None if self.malformed => return None,
                None => break,
            }

            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return self.fail(),
            }
        }
        Some(Value::Array(items))
    }

    /// Returns the decoded text and whether the closing quote was seen.
    /// A trailing escape that has not fully arrived is dropped.
    fn string(&mut self) -> Option<(String, bool)> {
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '"' => return Some((out, true)),
                '\\' => match self.escape() {
                    Some(decoded) => out.push(decoded),
                    None if self.malformed => return None,
                    None => {
                        self.pos = self.chars.len();
                        return Some((out, false));
                    }
                },
                c => out.push(c),
            }
        }
        Some((out, false))
    }

    fn escape(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        let decoded = match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => return self.unicode_escape(),
            _ => {
                self.malformed = true;
                return None;
            }
        };
        Some(decoded)
    }

    fn hex4(&mut self) -> Option<u32> {
        if self.pos + 4 > self.chars.len() {
            return None;
        }
        let digits: String = self.chars[self.pos..self.pos + 4].iter().collect();
        match u32::from_str_radix(&digits, 16) {
            Ok(code) => {
                self.pos += 4;
                Some(code)
            }
            Err(_) => {
                self.malformed = true;
                None
            }
        }
    }

    fn unicode_escape(&mut self) -> Option<char> {
        let high = self.hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        // Surrogate pair: the low half must follow as another \u escape.
        let remaining = self.chars.len() - self.pos;
        if remaining < 2 {
            return None;
        }
        if self.chars[self.pos] != '\\' || self.chars[self.pos + 1] != 'u' {
            return Some(char::REPLACEMENT_CHARACTER);
        }
        let escape_start = self.pos;
        self.pos += 2;
        let low = self.hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            // Lone high surrogate; the next escape is decoded on its own.
            self.pos = escape_start;
            return Some(char::REPLACEMENT_CHARACTER);
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn literal(&mut self, word: &str, value: Value) -> Option<Value> {
        for expected in word.chars() {
            match self.peek() {
                None => return None,
                Some(c) if c == expected => self.pos += 1,
                Some(_) => return self.fail(),
            }
        }
        Some(value)
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        // More digits may still arrive.
        if self.at_end() {
            return None;
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let parsed = text
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64));

        match parsed {
            Some(n) => Some(Value::Number(n)),
            None => self.fail(),
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(input: &str) -> Option<Value> {
        parse_partial_json(input).unwrap()
    }

    #[test]
    fn test_complete_document_parses_normally() {
        let input = r#"{"summary": "Done.", "escalation": null, "n": [1, 2.5, true]}"#;
        assert_eq!(
            parse(input),
            Some(json!({"summary": "Done.", "escalation": null, "n": [1, 2.5, true]}))
        );
    }

    #[test]
    fn test_truncated_string_value_keeps_prefix() {
        assert_eq!(
            parse(r#"{"summary": "Maria has not resp"#),
            Some(json!({"summary": "Maria has not resp"}))
        );
    }

    #[test]
    fn test_truncated_key_is_dropped() {
        assert_eq!(
            parse(r#"{"summary": "Done.", "escal"#),
            Some(json!({"summary": "Done."}))
        );
        assert_eq!(parse(r#"{"sum"#), Some(json!({})));
    }

    #[test]
    fn test_key_without_value_is_dropped() {
        assert_eq!(
            parse(r#"{"summary": "Done.", "escalation": "#),
            Some(json!({"summary": "Done."}))
        );
        assert_eq!(parse(r#"{"summary""#), Some(json!({})));
    }

    #[test]
    fn test_partial_literals_and_numbers_wait_for_more_input() {
        assert_eq!(parse(r#"{"ok": tr"#), Some(json!({})));
        assert_eq!(parse(r#"{"n": -"#), Some(json!({})));
        assert_eq!(parse(r#"{"n": 12"#), Some(json!({})));
        assert_eq!(parse(r#"{"n": 12,"#), Some(json!({"n": 12})));
        assert_eq!(parse(r#"[1.5]"#), Some(json!([1.5])));
        assert_eq!(parse("7"), None);
    }

    #[test]
    fn test_nested_containers_close_implicitly() {
        assert_eq!(
            parse(r#"{"a": {"b": ["x", "y"#),
            Some(json!({"a": {"b": ["x", "y"]}}))
        );
    }

    #[test]
    fn test_trailing_escape_is_dropped_until_complete() {
        assert_eq!(parse(r#"{"summary": "line\"#), Some(json!({"summary": "line"})));
        assert_eq!(parse(r#"{"summary": "caf\u00"#), Some(json!({"summary": "caf"})));
        assert_eq!(
            parse(r#"{"summary": "caf\u00e9 \"ok\"\n"#),
            Some(json!({"summary": "café \"ok\"\n"}))
        );
    }

    #[test]
    fn test_surrogate_pairs_decode() {
        assert_eq!(parse(r#"["\ud83d\ude00"]"#), Some(json!(["😀"])));
        assert_eq!(parse(r#"["a\ud83d"#), Some(json!(["a"])));
    }

    #[test]
    fn test_high_surrogate_without_low_half_is_replaced() {
        assert_eq!(parse(r#"["\ud83d\u0041"]"#), Some(json!(["\u{FFFD}A"])));
        assert_eq!(parse(r#"["\ud83dB"]"#), Some(json!(["\u{FFFD}B"])));
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        assert_eq!(parse_partial_json(""), Ok(None));
        assert_eq!(parse_partial_json("   "), Ok(None));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(parse_partial_json("{\"a\" 1}").is_err());
        assert!(parse_partial_json("{\"a\": x}").is_err());
        assert!(parse_partial_json("{\"a\": 1} trailing").is_err());
        assert!(parse_partial_json("{\"a\": \"\\q\"}").is_err());
        assert!(parse_partial_json("{\"summary\": \"ok\", x").is_err());
    }

    #[test]
    fn test_decoder_emits_only_on_change() {
        let mut decoder = PartialObjectDecoder::default();
        assert_eq!(decoder.push("{"), Ok(Some(json!({}))));
        assert_eq!(decoder.push("\"summ"), Ok(None));
        assert_eq!(decoder.push("ary\": \""), Ok(Some(json!({"summary": ""}))));
        assert_eq!(decoder.push("Mar"), Ok(Some(json!({"summary": "Mar"}))));
        assert_eq!(decoder.push("ia\"}"), Ok(Some(json!({"summary": "Maria"}))));
        assert_eq!(decoder.push("\n"), Ok(None));
        assert_eq!(decoder.finish().unwrap(), None);
    }

    #[test]
    fn test_decoder_reports_malformed_fragment() {
        let mut decoder = PartialObjectDecoder::default();
        assert_eq!(
            decoder.push("{\"summary\": \"ok\""),
            Ok(Some(json!({"summary": "ok"})))
        );
        assert!(decoder.push(", x").is_err());
    }

    #[test]
    fn test_finish_rejects_truncated_buffer() {
        let mut decoder = PartialObjectDecoder::default();
        assert_eq!(
            decoder.push("{\"summary\": \"Maria has not resp"),
            Ok(Some(json!({"summary": "Maria has not resp"})))
        );
        assert!(decoder.finish().is_err());
    }

    #[test]
    fn test_finish_yields_value_held_back_while_streaming() {
        let mut decoder = PartialObjectDecoder::default();
        assert_eq!(decoder.push("42"), Ok(None));
        assert_eq!(decoder.finish().unwrap(), Some(json!(42)));
    }

    #[test]
    fn test_finish_without_input_is_an_error() {
        assert!(PartialObjectDecoder::default().finish().is_err());
    }
}
