//! OpenStep ASCII property list parser.

use std::collections::BTreeMap;

use super::SerializeError;
use super::value::PlistValue;

/// Parse an ASCII property list into a document of strings, arrays and
/// dictionaries.
///
/// # Errors
///
/// Returns [`SerializeError::Parse`] with the character offset of the first
/// malformed construct.
pub fn parse_document(text: &str) -> Result<PlistValue, SerializeError> {
    let mut parser = Parser {
        chars: text.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error("trailing content after document"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: &str) -> SerializeError {
        SerializeError::Parse {
            offset: self.pos,
            message: message.to_owned(),
        }
    }

    /// Skip whitespace and both comment styles.
    fn skip_trivia(&mut self) -> Result<(), SerializeError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => return Err(self.error("unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SerializeError> {
        self.skip_trivia()?;
        if self.bump() == Some(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn value(&mut self) -> Result<PlistValue, SerializeError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.dict(),
            Some('(') => self.array(),
            Some('"') => self.quoted().map(PlistValue::String),
            Some(_) => self.bare().map(PlistValue::String),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn dict(&mut self) -> Result<PlistValue, SerializeError> {
        self.expect('{')?;
        let mut entries = BTreeMap::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(PlistValue::Dict(entries));
            }
            let key = match self.value()? {
                PlistValue::String(key) => key,
                _ => return Err(self.error("dictionary keys must be strings")),
            };
            self.expect('=')?;
            let value = self.value()?;
            self.expect(';')?;
            entries.insert(key, value);
        }
    }

    fn array(&mut self) -> Result<PlistValue, SerializeError> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(')') {
                self.pos += 1;
                return Ok(PlistValue::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(')') => {}
                _ => return Err(self.error("expected ',' or ')'")),
            }
        }
    }

    fn bare(&mut self) -> Result<String, SerializeError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !"{}()=;,\"".contains(c))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a value"));
        }
        Ok(self.chars.iter().skip(start).take(self.pos - start).collect())
    }

    fn quoted(&mut self) -> Result<String, SerializeError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => text.push(self.escape()?),
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> Result<char, SerializeError> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('U') => {
                let digits: String = (0..4).filter_map(|_| self.bump()).collect();
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("invalid \\U escape"))
            }
            Some(c @ ('\\' | '"' | '\'')) => Ok(c),
            Some(_) => Err(self.error("unknown escape")),
            None => Err(self.error("unterminated escape")),
        }
    }
}
