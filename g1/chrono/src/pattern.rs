//! Custom Date/Time Pattern
//!
//! Patterns use the familiar custom date/time letters (`yyyy-MM-dd HH:mm:ss.fff`), not the
//! `strftime` syntax.  A pattern is compiled once into a sequence of tokens and then reused for
//! both formatting and exact-match parsing.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use snafu::prelude::*;

use crate::{Error, TrailingEscapeSnafu, UnsupportedSpecifierSnafu, UnterminatedQuoteSnafu};

#[derive(Clone)]
pub struct Pattern(Arc<Inner>);

struct Inner {
    source: String,
    tokens: Vec<Token>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Token {
    Literal(String),
    /// `y` and `yy`: the last two digits of the year.
    ShortYear(Pad),
    /// `yyy` and longer: the full year, zero-padded to the width.
    Year(usize),
    Month(Pad),
    MonthName(Name),
    Day(Pad),
    WeekdayName(Name),
    Hour(Pad),
    Hour12(Pad),
    Minute(Pad),
    Second(Pad),
    /// `f` to `fffffffff`.
    Fraction(usize),
    /// `F` to `FFFFFFFFF`: trailing zeros are dropped, and so is the `.` in front of a zero
    /// fraction.
    TrimmedFraction { width: usize, dot: bool },
    AmPm(Name),
    Offset(OffsetStyle),
    /// `K`: `Z` for a zero offset and nothing for a value without offset.
    OffsetOrUtc,
}

/// Numeric fields are either 1-2 digits (single letter) or exactly 2 digits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Pad {
    None,
    Zero,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Name {
    Short,
    Long,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OffsetStyle {
    /// `z`: `+2`.
    Hours,
    /// `zz`: `+02`.
    PaddedHours,
    /// `zzz`: `+02:00`.
    Full,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, Error> {
        ensure!(!source.is_empty(), crate::EmptySnafu);
        let tokens = Compiler::new(source).compile()?;
        Ok(Self(Arc::new(Inner {
            source: source.to_string(),
            tokens,
        })))
    }

    pub fn as_str(&self) -> &str {
        &self.0.source
    }

    pub(crate) fn tokens(&self) -> &[Token] {
        &self.0.tokens
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.0.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.source == other.0.source
    }
}

impl Eq for Pattern {}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::new(source)
    }
}

const MAX_FRACTION_WIDTH: usize = 9;

struct Compiler<'a> {
    source: &'a str,
    chars: Vec<char>,
    tokens: Vec<Token>,
    literal: String,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            tokens: Vec::new(),
            literal: String::new(),
        }
    }

    fn compile(mut self) -> Result<Vec<Token>, Error> {
        let mut i = 0;
        while i < self.chars.len() {
            let ch = self.chars[i];
            let n = self.chars[i..].iter().take_while(|c| **c == ch).count();
            i += match ch {
                'y' => match n {
                    1 => self.push(Token::ShortYear(Pad::None), n),
                    2 => self.push(Token::ShortYear(Pad::Zero), n),
                    _ => self.push(Token::Year(n.max(4)), n),
                },
                'M' => self.named(n, Token::Month, Token::MonthName),
                'd' => self.named(n, Token::Day, Token::WeekdayName),
                'H' => self.push(Token::Hour(pad(n)), n),
                'h' => self.push(Token::Hour12(pad(n)), n),
                'm' => self.push(Token::Minute(pad(n)), n),
                's' => self.push(Token::Second(pad(n)), n),
                'f' if n <= MAX_FRACTION_WIDTH => self.push(Token::Fraction(n), n),
                'F' if n <= MAX_FRACTION_WIDTH => {
                    let dot = self.literal.ends_with('.');
                    if dot {
                        self.literal.pop();
                    }
                    self.push(Token::TrimmedFraction { width: n, dot }, n)
                }
                't' => self.push(
                    Token::AmPm(if n == 1 { Name::Short } else { Name::Long }),
                    n,
                ),
                'z' => self.push(
                    Token::Offset(match n {
                        1 => OffsetStyle::Hours,
                        2 => OffsetStyle::PaddedHours,
                        _ => OffsetStyle::Full,
                    }),
                    n,
                ),
                'K' if n == 1 => self.push(Token::OffsetOrUtc, n),
                'f' | 'F' | 'g' | 'K' => return self.unsupported(ch, n),
                '\'' | '"' => self.quoted(i, ch)?,
                '\\' => {
                    let escaped = self
                        .chars
                        .get(i + 1)
                        .copied()
                        .context(TrailingEscapeSnafu {
                            pattern: self.source,
                        })?;
                    self.literal.push(escaped);
                    2
                }
                // `%` only marks a single-letter pattern and produces no output.
                '%' => 1,
                _ => {
                    self.literal.push(ch);
                    1
                }
            };
        }
        self.flush();
        Ok(self.tokens)
    }

    /// Month and day: one or two letters are numeric, three or more letters are names.
    fn named(&mut self, n: usize, numeric: fn(Pad) -> Token, name: fn(Name) -> Token) -> usize {
        let token = match n {
            1 | 2 => numeric(pad(n)),
            3 => name(Name::Short),
            _ => name(Name::Long),
        };
        self.push(token, n)
    }

    /// Consumes a quoted literal starting at `start` and returns its length including quotes.
    fn quoted(&mut self, start: usize, quote: char) -> Result<usize, Error> {
        let mut i = start + 1;
        loop {
            match self.chars.get(i) {
                Some(ch) if *ch == quote => return Ok(i + 1 - start),
                Some('\\') => {
                    let escaped = self.chars.get(i + 1).context(TrailingEscapeSnafu {
                        pattern: self.source,
                    })?;
                    self.literal.push(*escaped);
                    i += 2;
                }
                Some(ch) => {
                    self.literal.push(*ch);
                    i += 1;
                }
                None => {
                    return UnterminatedQuoteSnafu {
                        pattern: self.source,
                    }
                    .fail();
                }
            }
        }
    }

    fn push(&mut self, token: Token, n: usize) -> usize {
        self.flush();
        self.tokens.push(token);
        n
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.tokens
                .push(Token::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn unsupported<T>(&self, ch: char, n: usize) -> Result<T, Error> {
        UnsupportedSpecifierSnafu {
            pattern: self.source,
            specifier: String::from_iter(std::iter::repeat_n(ch, n)),
        }
        .fail()
    }
}

fn pad(n: usize) -> Pad {
    if n == 1 { Pad::None } else { Pad::Zero }
}
