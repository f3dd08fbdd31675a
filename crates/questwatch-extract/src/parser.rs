use crate::error::{ParseError, Result};
use serde_json::{Map, Number, Value};

/// Decode one loosely-formatted block into a [`Value`].
///
/// Accepts the dialect found in the tracked page: unquoted keys, single- or
/// double-quoted strings, trailing commas, bare words, and arbitrarily
/// nested objects and arrays. The whole span must be a single value;
/// anything left over after it is an error, as is a truncated span.
pub fn parse(text: &str) -> Result<Value> {
    let mut parser = Parser { text, pos: 0 };
    parser.skip_ws();
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < parser.text.len() {
        return Err(ParseError::TrailingInput { pos: parser.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(ParseError::UnexpectedChar {
                found: c,
                pos: self.pos,
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn value(&mut self) -> Result<Value> {
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some('"' | '\'') => Ok(Value::String(self.quoted_string()?)),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if is_word_char(c) => Ok(self.word()),
            Some(c) => Err(ParseError::UnexpectedChar {
                found: c,
                pos: self.pos,
            }),
        }
    }

    fn object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some(_) => {}
                None => return Err(ParseError::UnexpectedEof),
            }
            let key = self.key()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                Some(c) => {
                    return Err(ParseError::UnexpectedChar {
                        found: c,
                        pos: self.pos,
                    })
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    fn array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                Some(_) => {}
                None => return Err(ParseError::UnexpectedEof),
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => {
                    return Err(ParseError::UnexpectedChar {
                        found: c,
                        pos: self.pos,
                    })
                }
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    fn key(&mut self) -> Result<String> {
        match self.peek() {
            Some('"' | '\'') => self.quoted_string(),
            Some(c) if is_word_char(c) || c == '-' => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if is_word_char(c) || c == '-') {
                    self.bump();
                }
                Ok(self.text[start..self.pos].to_string())
            }
            Some(c) => Err(ParseError::UnexpectedChar {
                found: c,
                pos: self.pos,
            }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn quoted_string(&mut self) -> Result<String> {
        let start = self.pos;
        let quote = self.bump().expect("caller checked for a quote");
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { pos: start }),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escape_pos = self.pos - 1;
                    match self.bump() {
                        None => return Err(ParseError::UnterminatedString { pos: start }),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some('r') => out.push('\r'),
                        Some('b') => out.push('\u{8}'),
                        Some('f') => out.push('\u{c}'),
                        Some('u') => out.push(self.unicode_escape(escape_pos)?),
                        // The page escapes quotes and slashes; pass anything
                        // else through untouched.
                        Some(c) => out.push(c),
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self, escape_pos: usize) -> Result<char> {
        let hex_start = self.pos;
        for _ in 0..4 {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => {}
                _ => return Err(ParseError::InvalidEscape { pos: escape_pos }),
            }
        }
        let code = u32::from_str_radix(&self.text[hex_start..self.pos], 16)
            .map_err(|_| ParseError::InvalidEscape { pos: escape_pos })?;
        char::from_u32(code).ok_or(ParseError::InvalidEscape { pos: escape_pos })
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some('0'..='9' | '-' | '+' | '.' | 'e' | 'E')
        ) {
            self.bump();
        }
        let token = &self.text[start..self.pos];
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Value::Number(Number::from(n)));
        }
        let float = token
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber { pos: start })?;
        Number::from_f64(float)
            .map(Value::Number)
            .ok_or(ParseError::InvalidNumber { pos: start })
    }

    // Bare words: `true`/`false`/`null` keywords, everything else decodes
    // as a string, matching the page's unquoted identifier values.
    fn word(&mut self) -> Value {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_word_char(c)) {
            self.bump();
        }
        match &self.text[start..self.pos] {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" | "undefined" => Value::Null,
            word => Value::String(word.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_json_still_parses() {
        let value = parse(r#"{"id": 41896, "name": "Operation Murloc Freedom"}"#)
            .expect("parse strict JSON");
        assert_eq!(
            value,
            json!({"id": 41896, "name": "Operation Murloc Freedom"})
        );
    }

    #[test]
    fn test_unquoted_keys_and_single_quotes() {
        let value = parse("{reqclass:0,reqrace:0,name_enus:'Operation Murloc Freedom'}")
            .expect("parse page dialect");
        assert_eq!(
            value,
            json!({"reqclass": 0, "reqrace": 0, "name_enus": "Operation Murloc Freedom"})
        );
    }

    #[test]
    fn test_trailing_commas() {
        let value = parse("{a: 1, b: [1, 2, 3,], }").expect("parse trailing commas");
        assert_eq!(value, json!({"a": 1, "b": [1, 2, 3]}));
    }

    #[test]
    fn test_nested_depth() {
        let value = parse("{a:{b:{c:[{d:'deep'}]}}}").expect("parse nested");
        assert_eq!(value, json!({"a": {"b": {"c": [{"d": "deep"}]}}}));
    }

    #[test]
    fn test_numbers() {
        let value = parse("[0, -17, 3.5, 1e3]").expect("parse numbers");
        assert_eq!(value, json!([0, -17, 3.5, 1000.0]));
    }

    #[test]
    fn test_keywords_and_bare_words() {
        let value = parse("{a: true, b: false, c: null, d: undefined, e: worldquest}")
            .expect("parse words");
        assert_eq!(
            value,
            json!({"a": true, "b": false, "c": null, "d": null, "e": "worldquest"})
        );
    }

    #[test]
    fn test_escapes() {
        let value = parse(r"'it\'s a trap\n'").expect("parse escapes");
        assert_eq!(value, json!("it's a trap\n"));

        let value = parse(r#""\u0041""#).expect("parse unicode escape");
        assert_eq!(value, json!("A"));
    }

    #[test]
    fn test_truncated_object_fails() {
        assert_eq!(parse("{a: 1, b: {c: 2}"), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert_eq!(
            parse("'no closing quote"),
            Err(ParseError::UnterminatedString { pos: 0 })
        );
    }

    #[test]
    fn test_trailing_garbage_fails() {
        assert_eq!(
            parse("{a: 1} extra"),
            Err(ParseError::TrailingInput { pos: 7 })
        );
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEof));
        assert_eq!(parse("   "), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn test_listing_shaped_block() {
        let value = parse(
            "{template: 'worldquest', id: 'world-quests', \
             data: [{id:41896, ending:1483228800000, worldquesttype:1, factions:[], zones:[-1]}]}",
        )
        .expect("parse listing block");
        let data = value.get("data").and_then(Value::as_array).expect("data");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].get("id"), Some(&json!(41896)));
        assert_eq!(data[0].get("zones"), Some(&json!([-1])));
    }
}
