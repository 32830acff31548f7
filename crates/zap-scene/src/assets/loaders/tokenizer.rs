//! Byte cursor for the line-oriented text formats (BMFont, OBJ, MTL).

use crate::error::TextError;

pub fn is_whitespace(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

pub fn is_newline(c: u8) -> bool {
    c == b'\r' || c == b'\n'
}

pub fn is_control(c: u8) -> bool {
    c <= 0x1F
}

#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn advance(&mut self) {
        if self.pos < self.data.len() {
            self.pos += 1;
        }
    }

    /// True at a newline or at the end of data.
    pub fn at_line_end(&self) -> bool {
        self.peek().map_or(true, is_newline)
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    /// Skip past the next newline (or to the end).
    pub fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if is_newline(c) {
                break;
            }
        }
    }

    /// Consume `token` if it is next.
    pub fn parse_token(&mut self, token: u8) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_token(&mut self, token: u8) -> Result<(), TextError> {
        if self.parse_token(token) {
            Ok(())
        } else {
            Err(TextError::UnexpectedToken(char::from(token)))
        }
    }

    fn take_while(&mut self, mut accept: impl FnMut(u8) -> bool) -> &'a [u8] {
        let data = self.data;
        let start = self.pos;
        while self.peek().is_some_and(&mut accept) {
            self.pos += 1;
        }
        &data[start..self.pos]
    }

    fn to_str(bytes: &[u8]) -> Result<&str, TextError> {
        std::str::from_utf8(bytes).map_err(|_| TextError::InvalidString)
    }

    /// Maximal run of non-control, non-whitespace bytes.
    pub fn parse_word(&mut self) -> Result<&'a str, TextError> {
        let word = self.take_while(|c| !is_control(c) && !is_whitespace(c));
        if word.is_empty() {
            return Err(TextError::InvalidString);
        }
        Self::to_str(word)
    }

    /// A word that also stops at `=`, or a quoted string. Quotes are
    /// stripped; a quote only closes when followed by whitespace, a
    /// newline or the end of data.
    pub fn parse_key_or_quoted(&mut self) -> Result<&'a str, TextError> {
        if self.peek().is_none() {
            return Err(TextError::InvalidString);
        }

        if self.parse_token(b'"') {
            let data = self.data;
            let start = self.pos;
            loop {
                let Some(c) = self.peek() else {
                    return Err(TextError::UnterminatedString);
                };
                if c == b'"' {
                    let closes = data
                        .get(self.pos + 1)
                        .map_or(true, |&n| is_whitespace(n) || is_newline(n));
                    if closes {
                        let end = self.pos;
                        self.pos += 1;
                        return Self::to_str(&data[start..end]);
                    }
                }
                self.pos += 1;
            }
        }

        let word = self.take_while(|c| !is_control(c) && !is_whitespace(c) && c != b'=');
        if word.is_empty() {
            return Err(TextError::InvalidString);
        }
        Self::to_str(word)
    }

    /// Optional `-` followed by decimal digits.
    pub fn parse_i64(&mut self) -> Result<i64, TextError> {
        let start = self.pos;
        self.parse_token(b'-');
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(TextError::InvalidInteger);
        }
        Self::to_str(&self.data[start..self.pos])?
            .parse()
            .map_err(|_| TextError::InvalidInteger)
    }

    pub fn parse_i32(&mut self) -> Result<i32, TextError> {
        i32::try_from(self.parse_i64()?).map_err(|_| TextError::InvalidInteger)
    }

    /// Optional sign, integer part, optional fraction, optional exponent.
    pub fn parse_f32(&mut self) -> Result<f32, TextError> {
        let start = self.pos;
        if !self.parse_token(b'-') {
            self.parse_token(b'+');
        }
        let mut digits = self.take_while(|c| c.is_ascii_digit()).len();
        if self.parse_token(b'.') {
            digits += self.take_while(|c| c.is_ascii_digit()).len();
        }
        if digits == 0 {
            return Err(TextError::InvalidFloat);
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if !self.parse_token(b'+') {
                self.parse_token(b'-');
            }
            if self.take_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(TextError::InvalidExponent);
            }
        }

        Self::to_str(&self.data[start..self.pos])?
            .parse()
            .map_err(|_| TextError::InvalidFloat)
    }
}
