//! JSONC parser
//!
//! Recursive descent over the source text. Whitespace and comments are never
//! discarded: they are captured as trivia strings and attached to the nearest
//! member, element or closing bracket.

use super::{Array, Document, Element, JsonString, Member, Number, Object, Value};
use thiserror::Error;

/// Containers nested deeper than this are rejected instead of recursing further
const MAX_DEPTH: usize = 512;

/// Syntax error with a 1-based source position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

pub(super) fn parse_document(text: &str) -> Result<Document, ParseError> {
    let mut parser = Parser::new(text);

    let mut leading = String::new();
    if parser.rest().starts_with('\u{feff}') {
        leading.push('\u{feff}');
        parser.pos += '\u{feff}'.len_utf8();
    }
    leading.push_str(&parser.trivia()?);

    let root = parser.value()?;
    let trailing = parser.trivia()?;
    if parser.pos < text.len() {
        return Err(parser.error("unexpected content after the root value"));
    }

    Ok(Document {
        leading,
        root,
        trailing,
    })
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let consumed = &self.text[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = consumed[line_start..].chars().count() + 1;
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Whitespace and comments, returned verbatim
    fn trivia(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                let end = rest.find('\n').unwrap_or(rest.len());
                self.pos += end;
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => return Err(self.error("unterminated block comment")),
                }
            } else {
                match self.peek() {
                    Some(' ' | '\t' | '\n' | '\r') => self.pos += 1,
                    _ => break,
                }
            }
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        match self.peek() {
            Some('{') => self.nested(Self::object).map(Value::Object),
            Some('[') => self.nested(Self::array).map(Value::Array),
            Some('"') => self.string().map(Value::String),
            Some('-' | '0'..='9') => self.number().map(Value::Number),
            Some('t') => self.keyword("true", Value::Bool(true)),
            Some('f') => self.keyword("false", Value::Bool(false)),
            Some('n') => self.keyword("null", Value::Null),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of input, expected a value")),
        }
    }

    fn nested<T>(
        &mut self,
        parse: fn(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn keyword(&mut self, word: &str, value: Value) -> Result<Value, ParseError> {
        if self.rest().starts_with(word) {
            self.pos += word.len();
            Ok(value)
        } else {
            Err(self.error(format!("invalid literal, expected '{}'", word)))
        }
    }

    fn object(&mut self) -> Result<Object, ParseError> {
        self.expect('{')?;
        let mut members = Vec::new();
        let mut after_comma = false;

        loop {
            let leading = self.trivia()?;
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Object {
                    members,
                    close: leading,
                    trailing_comma: after_comma,
                });
            }

            if self.peek() != Some('"') {
                return Err(self.error("expected a string key or '}'"));
            }
            let key = self.string()?;
            let before_colon = self.trivia()?;
            self.expect(':')?;
            let after_colon = self.trivia()?;
            let value = self.value()?;
            let trivia = self.trivia()?;

            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    members.push(Member {
                        leading,
                        key,
                        before_colon,
                        after_colon,
                        value,
                        trailing: trivia,
                    });
                    after_comma = true;
                }
                Some('}') => {
                    self.pos += 1;
                    // Trivia before the brace belongs to the brace, so it
                    // survives when this member is later deleted
                    members.push(Member {
                        leading,
                        key,
                        before_colon,
                        after_colon,
                        value,
                        trailing: String::new(),
                    });
                    return Ok(Object {
                        members,
                        close: trivia,
                        trailing_comma: false,
                    });
                }
                _ => return Err(self.error("expected ',' or '}' after object member")),
            }
        }
    }

    fn array(&mut self) -> Result<Array, ParseError> {
        self.expect('[')?;
        let mut elements = Vec::new();
        let mut after_comma = false;

        loop {
            let leading = self.trivia()?;
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Array {
                    elements,
                    close: leading,
                    trailing_comma: after_comma,
                });
            }

            let value = self.value()?;
            let trivia = self.trivia()?;

            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    elements.push(Element {
                        leading,
                        value,
                        trailing: trivia,
                    });
                    after_comma = true;
                }
                Some(']') => {
                    self.pos += 1;
                    elements.push(Element {
                        leading,
                        value,
                        trailing: String::new(),
                    });
                    return Ok(Array {
                        elements,
                        close: trivia,
                        trailing_comma: false,
                    });
                }
                _ => return Err(self.error("expected ',' or ']' after array element")),
            }
        }
    }

    fn string(&mut self) -> Result<JsonString, ParseError> {
        let start = self.pos;
        self.expect('"')?;
        let mut value = String::new();

        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => self.escape(&mut value)?,
                Some(c) if (c as u32) < 0x20 => {
                    return Err(self.error("control character in string literal"));
                }
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }

        Ok(JsonString {
            raw: self.text[start..self.pos].to_string(),
            value,
        })
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let c = match self.bump() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{0008}',
            Some('f') => '\u{000c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let unit = self.hex4()?;
                if (0xD800..0xDC00).contains(&unit) && self.rest().starts_with("\\u") {
                    let checkpoint = self.pos;
                    self.pos += 2;
                    let low = self.hex4()?;
                    if (0xDC00..0xE000).contains(&low) {
                        let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                    } else {
                        self.pos = checkpoint;
                        char::REPLACEMENT_CHARACTER
                    }
                } else {
                    char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)
                }
            }
            Some(c) => return Err(self.error(format!("invalid escape '\\{}'", c))),
            None => return Err(self.error("unterminated string literal")),
        };
        out.push(c);
        Ok(())
    }

    fn hex4(&mut self) -> Result<u32, ParseError> {
        let digits = self.rest().get(..4).unwrap_or("");
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("invalid unicode escape"));
        }
        self.pos += 4;
        u32::from_str_radix(digits, 16).map_err(|e| self.error(e.to_string()))
    }

    fn digits(&mut self) -> usize {
        let count = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        self.pos += count;
        count
    }

    fn number(&mut self) -> Result<Number, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }

        match self.peek() {
            Some('0') => self.pos += 1,
            Some('1'..='9') => {
                self.digits();
            }
            _ => return Err(self.error("invalid number")),
        }

        if self.peek() == Some('.') {
            self.pos += 1;
            if self.digits() == 0 {
                return Err(self.error("expected digits after decimal point"));
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(self.error("expected digits in exponent"));
            }
        }

        let raw = &self.text[start..self.pos];
        let value = raw
            .parse::<f64>()
            .map_err(|e| self.error(format!("invalid number '{}': {}", raw, e)))?;
        Ok(Number {
            raw: raw.to_string(),
            value,
        })
    }
}
