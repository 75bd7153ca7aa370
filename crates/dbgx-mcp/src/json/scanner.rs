//! Forward-only scanner shared by the field extractor and its helpers.
//!
//! The scanner validates structure without building values: strings are
//! decoded (keys need their text), everything else is skipped so the caller
//! can record the raw byte range.

use super::errors::JsonError;

/// Deepest object/array nesting the skip parser follows.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Matches C `isspace` in the default locale: space, `\t`, `\n`, `\v`, `\f`
/// and `\r`.
pub(crate) const fn is_json_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

#[derive(Debug)]
pub(crate) struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    pub(crate) const fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes `expected` when it is the next byte.
    pub(crate) fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_json_space) {
            self.pos += 1;
        }
    }

    /// Returns the source text between two scanner positions.
    ///
    /// Positions always sit next to an ASCII delimiter, so the range is a
    /// valid char boundary.
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        self.text.get(start..end).unwrap_or_default()
    }

    /// Decodes one JSON string starting at the current position.
    pub(crate) fn parse_string(&mut self) -> Result<String, JsonError> {
        if !self.eat(b'"') {
            return Err(JsonError::ExpectedString { offset: self.pos });
        }

        let mut decoded = String::new();
        let mut run_start = self.pos;
        loop {
            let offset = self.pos;
            let Some(byte) = self.bump() else {
                return Err(JsonError::UnterminatedString);
            };
            match byte {
                b'"' => {
                    decoded.push_str(self.slice(run_start, offset));
                    return Ok(decoded);
                }
                b'\\' => {
                    decoded.push_str(self.slice(run_start, offset));
                    decoded.push(self.parse_escape()?);
                    run_start = self.pos;
                }
                control if control < 0x20 => {
                    return Err(JsonError::ControlCharacter { offset });
                }
                _ => {}
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, JsonError> {
        let Some(escape) = self.bump() else {
            return Err(JsonError::UnterminatedEscape);
        };
        match escape {
            b'"' => Ok('"'),
            b'\\' => Ok('\\'),
            b'/' => Ok('/'),
            b'b' => Ok('\u{08}'),
            b'f' => Ok('\u{0C}'),
            b'n' => Ok('\n'),
            b'r' => Ok('\r'),
            b't' => Ok('\t'),
            b'u' => self.parse_unicode_escape(),
            other => Err(JsonError::UnsupportedEscape {
                escape: char::from(other),
            }),
        }
    }

    /// Decodes exactly four hex digits as one code unit. Surrogate halves are
    /// not paired and decode to U+FFFD.
    fn parse_unicode_escape(&mut self) -> Result<char, JsonError> {
        let offset = self.pos;
        let digits = self
            .text
            .as_bytes()
            .get(offset..offset + 4)
            .ok_or(JsonError::InvalidUnicodeEscape { offset })?;
        let mut code_unit = 0_u32;
        for digit in digits {
            let value = char::from(*digit)
                .to_digit(16)
                .ok_or(JsonError::InvalidUnicodeEscape { offset })?;
            code_unit = (code_unit << 4) | value;
        }
        self.pos += 4;
        Ok(char::from_u32(code_unit).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Skips one complete value of any kind.
    pub(crate) fn skip_value(&mut self, depth: usize) -> Result<(), JsonError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(JsonError::ExpectedValue { offset: self.pos }),
            Some(b'{') => self.skip_object(depth + 1),
            Some(b'[') => self.skip_array(depth + 1),
            Some(b'"') => self.parse_string().map(drop),
            Some(_) => self.skip_literal(),
        }
    }

    fn skip_object(&mut self, depth: usize) -> Result<(), JsonError> {
        check_depth(depth)?;
        self.pos += 1;
        self.skip_whitespace();
        if self.eat(b'}') {
            return Ok(());
        }

        while !self.is_at_end() {
            self.parse_string()?;
            self.skip_whitespace();
            if !self.eat(b':') {
                return Err(JsonError::ExpectedColon { offset: self.pos });
            }
            self.skip_value(depth)?;
            self.skip_whitespace();
            match self.bump() {
                None => return Err(JsonError::UnterminatedObject),
                Some(b',') => self.skip_whitespace(),
                Some(b'}') => return Ok(()),
                Some(_) => {
                    return Err(JsonError::ExpectedObjectSeparator {
                        offset: self.pos - 1,
                    });
                }
            }
        }
        Err(JsonError::UnterminatedObject)
    }

    fn skip_array(&mut self, depth: usize) -> Result<(), JsonError> {
        check_depth(depth)?;
        self.pos += 1;
        self.skip_whitespace();
        if self.eat(b']') {
            return Ok(());
        }

        while !self.is_at_end() {
            self.skip_value(depth)?;
            self.skip_whitespace();
            match self.bump() {
                None => return Err(JsonError::UnterminatedArray),
                Some(b',') => self.skip_whitespace(),
                Some(b']') => return Ok(()),
                Some(_) => {
                    return Err(JsonError::ExpectedArraySeparator {
                        offset: self.pos - 1,
                    });
                }
            }
        }
        Err(JsonError::UnterminatedArray)
    }

    /// Bare literals (numbers, `true`, `false`, `null`) run until a
    /// delimiter or whitespace. Their spelling is not validated.
    fn skip_literal(&mut self) -> Result<(), JsonError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|byte| !matches!(byte, b',' | b'}' | b']') && !is_json_space(byte))
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(JsonError::ExpectedValue { offset: start });
        }
        Ok(())
    }
}

const fn check_depth(depth: usize) -> Result<(), JsonError> {
    if depth > MAX_NESTING_DEPTH {
        Err(JsonError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        })
    } else {
        Ok(())
    }
}
