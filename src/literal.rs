// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A reader for the literal subset of Python expressions that `*.gyp_env`
//! files are written in.
//!
//! Only data is produced: strings, numbers, `True`/`False`/`None`, lists,
//! tuples and dicts. Names, calls, attribute access and operators (other than
//! a unary sign on a number) are rejected; nothing is ever evaluated.
//!
//! Literals read the way Python 2 reads them: an integer with a leading zero
//! is octal, and `\u`/`\U` escapes are only decoded in `u''` strings.

use std::{fmt, num::IntErrorKind};

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// The top-level mapping of a literal file, in source order.
pub(crate) type Mapping = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) msg: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}, column {})", self.msg, self.line, self.column)
    }
}

impl std::error::Error for ParseError {}

/// Parses `s` as a single dict literal.
pub(crate) fn parse_mapping(s: &str) -> Result<Mapping, ParseError> {
    let mut parser = Parser::new(s);
    parser.skip_trivia();
    let map = match parser.peek() {
        Some('{') => parser.mapping()?,
        None => return Err(parser.error("expected a mapping literal, found end of input")),
        Some(_) => {
            let (line, column) = parser.position();
            match parser.value()? {
                // e.g. `({...})`
                Value::Object(map) => map.into_iter().collect(),
                found => {
                    return Err(ParseError {
                        line,
                        column,
                        msg: format!("expected a mapping literal, found {}", kind(&found)),
                    });
                }
            }
        }
    };
    parser.skip_trivia();
    if parser.peek().is_some() {
        return Err(parser.expected("end of input"));
    }
    Ok(map)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "`None`",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        // A leading byte order mark is not part of the expression.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self { src, pos: 0, line: 1, column: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError { line: self.line, column: self.column, msg: msg.into() }
    }

    fn expected(&self, what: &str) -> ParseError {
        match self.peek() {
            None => self.error(format!("expected {what}, found end of input")),
            Some(c) => self.error(format!("expected {what}, found `{c}`")),
        }
    }

    /// Skips whitespace, comments and explicit line joins.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\n' | '\r' | '\x0c') => {
                    self.bump();
                }
                Some('#') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.bump();
                    }
                }
                Some('\\') if matches!(self.peek_nth(1), Some('\n' | '\r')) => {
                    self.bump();
                    self.eat('\r');
                    self.eat('\n');
                }
                _ => return,
            }
        }
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.expected("a value")),
            Some('{') => Ok(Value::Object(self.mapping()?.into_iter().collect::<Map<_, _>>())),
            Some('[') => {
                self.bump();
                Ok(Value::Array(self.sequence(']')?))
            }
            Some('(') => self.parenthesized(),
            Some(_) if self.string_prefix_len().is_some() => self.strings().map(Value::String),
            Some(c) if matches!(c, '-' | '+' | '.') || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.keyword(),
            Some(c) => Err(self.error(format!("unexpected character `{c}`"))),
        }
    }

    fn mapping(&mut self) -> Result<Mapping, ParseError> {
        debug_assert_eq!(self.peek(), Some('{'));
        self.bump();
        let mut map = Mapping::new();
        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Ok(map);
            }

            let (line, column) = self.position();
            let key = match self.value()? {
                Value::String(key) => key,
                other => {
                    return Err(ParseError {
                        line,
                        column,
                        msg: format!("mapping keys must be strings, found {}", kind(&other)),
                    });
                }
            };
            self.skip_trivia();
            if !self.eat(':') {
                return Err(self.expected("`:`"));
            }
            let value = self.value()?;
            map.insert(key, value);

            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                return Ok(map);
            }
            return Err(self.expected("`,` or `}`"));
        }
    }

    /// Parses the items of a list or tuple; the opening bracket has already
    /// been consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>, ParseError> {
        let mut items = vec![];
        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                return Ok(items);
            }
            return Err(self.expected(&format!("`,` or `{close}`")));
        }
    }

    /// `()` and `(a, ...)` are tuples, `(a)` is just `a`.
    fn parenthesized(&mut self) -> Result<Value, ParseError> {
        debug_assert_eq!(self.peek(), Some('('));
        self.bump();
        self.skip_trivia();
        if self.eat(')') {
            return Ok(Value::Array(vec![]));
        }
        let first = self.value()?;
        self.skip_trivia();
        if self.eat(')') {
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.expected("`,` or `)`"));
        }
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Ok(Value::Array(items))
    }

    fn keyword(&mut self) -> Result<Value, ParseError> {
        let (line, column) = self.position();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            name => Err(ParseError {
                line,
                column,
                msg: format!("`{name}` is not a literal; only literal values are allowed"),
            }),
        }
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let (line, column) = self.position();
        let error = |msg: &str| ParseError { line, column, msg: msg.to_owned() };

        let mut negative = false;
        loop {
            match self.peek() {
                Some('-') => negative = !negative,
                Some('+') => {}
                _ => break,
            }
            self.bump();
            self.skip_trivia();
        }

        if self.peek() == Some('0') {
            let radix = match self.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.bump();
                self.bump();
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.bump();
                }
                let text: String =
                    self.src[start..self.pos].chars().filter(|&c| c != '_').collect();
                return integer(&text, radix, negative, error);
            }
        }

        let start = self.pos;
        let mut float = false;
        self.digits();
        if self.eat('.') {
            float = true;
            self.digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) && self.pos > start {
            float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.digits();
        }
        if matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            return Err(error("invalid number literal"));
        }

        let text: String = self.src[start..self.pos].chars().filter(|&c| c != '_').collect();
        if !text.bytes().any(|b| b.is_ascii_digit()) {
            return Err(error("expected a number"));
        }

        if float {
            let n: f64 = text.parse().map_err(|_| error("invalid number literal"))?;
            let n = if negative { -n } else { n };
            return Number::from_f64(n).map(Value::Number).ok_or_else(|| error("number out of range"));
        }
        let radix = if text.len() > 1 && text.starts_with('0') { 8 } else { 10 };
        integer(&text, radix, negative, error)
    }

    fn digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    /// Returns the length of the string prefix (`r`, `u`, `ur`, any case) if
    /// a string literal starts here.
    fn string_prefix_len(&self) -> Option<usize> {
        let rest = self.rest();
        let len = rest.find(|c: char| !matches!(c, 'r' | 'R' | 'u' | 'U')).unwrap_or(rest.len());
        let valid = matches!(rest[..len].to_ascii_lowercase().as_str(), "" | "r" | "u" | "ur");
        (valid && rest[len..].starts_with(['\'', '"'])).then_some(len)
    }

    /// Parses one or more adjacent string literals and concatenates them.
    fn strings(&mut self) -> Result<String, ParseError> {
        let mut out = self.string()?;
        loop {
            self.skip_trivia();
            if self.string_prefix_len().is_none() {
                return Ok(out);
            }
            out.push_str(&self.string()?);
        }
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let (line, column) = self.position();
        let unterminated =
            || ParseError { line, column, msg: "unterminated string literal".to_owned() };

        let prefix_len = self.string_prefix_len().ok_or_else(|| self.expected("a string"))?;
        let prefix = &self.rest()[..prefix_len];
        let raw = prefix.contains(['r', 'R']);
        let unicode = prefix.contains(['u', 'U']);
        for _ in 0..prefix_len {
            self.bump();
        }
        let quote = self.bump().ok_or_else(unterminated)?;
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(unterminated)?;
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
                out.push(c);
            } else if c == '\n' && !triple {
                return Err(unterminated());
            } else if c == '\\' {
                if raw {
                    // The backslash stays, but still protects the next character.
                    out.push(c);
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.escape(&mut out, unicode)?;
                }
            } else {
                out.push(c);
            }
        }
    }

    /// Decodes an escape sequence; the backslash has already been consumed.
    fn escape(&mut self, out: &mut String, unicode: bool) -> Result<(), ParseError> {
        let Some(c) = self.bump() else {
            // Reported as an unterminated string by the caller.
            return Ok(());
        };
        match c {
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut n = c.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            n = n * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.char_from(n)?);
            }
            'x' => {
                let n = self.hex_digits(2, c)?;
                out.push(self.char_from(n)?);
            }
            'u' if unicode => {
                let n = self.hex_digits(4, c)?;
                out.push(self.char_from(n)?);
            }
            'U' if unicode => {
                let n = self.hex_digits(8, c)?;
                out.push(self.char_from(n)?);
            }
            _ => {
                out.push('\\');
                out.push(c);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize, escape: char) -> Result<u32, ParseError> {
        let mut n = 0;
        for _ in 0..count {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    n = n * 16 + d;
                    self.bump();
                }
                None => {
                    return Err(self.error(format!("truncated `\\{escape}` escape sequence")));
                }
            }
        }
        Ok(n)
    }

    fn char_from(&self, n: u32) -> Result<char, ParseError> {
        char::from_u32(n).ok_or_else(|| self.error(format!("invalid character code {n:#x}")))
    }
}

fn integer(
    text: &str,
    radix: u32,
    negative: bool,
    error: impl Fn(&str) -> ParseError,
) -> Result<Value, ParseError> {
    let n = u64::from_str_radix(text, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => error("integer literal out of range"),
        _ => error("invalid number literal"),
    })?;
    if !negative {
        return Ok(Value::Number(n.into()));
    }
    i64::try_from(-i128::from(n))
        .map(|n| Value::Number(n.into()))
        .map_err(|_| error("integer literal out of range"))
}
