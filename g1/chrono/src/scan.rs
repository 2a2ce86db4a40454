use chrono::Weekday;
use chrono::format::{ParseResult, Parsed};
use snafu::prelude::*;

use crate::pattern::{Name, OffsetStyle, Pad, Pattern, Token};
use crate::render::{MONTHS, WEEKDAYS, abbreviate, am_pm};
use crate::{Error, InvalidSnafu, MismatchSnafu};

/// Two-digit years resolve into the hundred years that end with this one.
const TWO_DIGIT_YEAR_MAX: i64 = 2049;

const WEEKDAY_VALUES: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Matches the whole `input` against `pattern`, character by character.
///
/// Numeric fields take exactly as many digits as the pattern letters call for (one-letter fields
/// take one or two), and whitespace only matches whitespace in the pattern.
pub(crate) fn scan(input: &str, pattern: &Pattern) -> Result<Parsed, Error> {
    let mut scanner = Scanner { rest: input };
    let mut parsed = Parsed::new();
    for token in pattern.tokens() {
        let position = input.len() - scanner.rest.len();
        scanner
            .token(token)
            .context(MismatchSnafu {
                input,
                pattern: pattern.as_str(),
                position,
            })?
            .apply(&mut parsed)
            .context(InvalidSnafu {
                input,
                pattern: pattern.as_str(),
            })?;
    }
    ensure!(
        scanner.rest.is_empty(),
        MismatchSnafu {
            input,
            pattern: pattern.as_str(),
            position: input.len() - scanner.rest.len(),
        }
    );
    Ok(parsed)
}

enum Field {
    Nothing,
    Year(i64),
    Month(i64),
    Day(i64),
    Weekday(Weekday),
    Hour(i64),
    Hour12(i64),
    Minute(i64),
    Second(i64),
    Nanosecond(i64),
    AmPm(bool),
    Offset(i64),
}

impl Field {
    fn apply(self, parsed: &mut Parsed) -> ParseResult<()> {
        match self {
            Self::Nothing => Ok(()),
            Self::Year(year) => parsed.set_year(year),
            Self::Month(month) => parsed.set_month(month),
            Self::Day(day) => parsed.set_day(day),
            Self::Weekday(weekday) => parsed.set_weekday(weekday),
            Self::Hour(hour) => parsed.set_hour(hour),
            Self::Hour12(hour) => parsed.set_hour12(hour),
            Self::Minute(minute) => parsed.set_minute(minute),
            Self::Second(second) => parsed.set_second(second),
            Self::Nanosecond(nanosecond) => parsed.set_nanosecond(nanosecond),
            Self::AmPm(pm) => parsed.set_ampm(pm),
            Self::Offset(offset) => parsed.set_offset(offset),
        }
    }
}

struct Scanner<'a> {
    rest: &'a str,
}

impl Scanner<'_> {
    fn token(&mut self, token: &Token) -> Option<Field> {
        Some(match token {
            Token::Literal(text) => {
                self.literal(text).then_some(Field::Nothing)?
            }
            Token::ShortYear(pad) => Field::Year(two_digit_year(self.number(*pad)?)),
            Token::Year(width) => Field::Year(self.digits(*width, *width)?.0),
            Token::Month(pad) => Field::Month(self.number(*pad)?),
            Token::MonthName(style) => {
                let month = self.name(&MONTHS.map(|name| abbreviate(name, *style)))?;
                Field::Month(month as i64 + 1)
            }
            Token::Day(pad) => Field::Day(self.number(*pad)?),
            Token::WeekdayName(style) => {
                let weekday = self.name(&WEEKDAYS.map(|name| abbreviate(name, *style)))?;
                Field::Weekday(WEEKDAY_VALUES[weekday])
            }
            Token::Hour(pad) => Field::Hour(self.number(*pad)?),
            Token::Hour12(pad) => Field::Hour12(self.number(*pad)?),
            Token::Minute(pad) => Field::Minute(self.number(*pad)?),
            Token::Second(pad) => Field::Second(self.number(*pad)?),
            Token::Fraction(width) => Field::Nanosecond(nanoseconds(self.digits(*width, *width)?)),
            Token::TrimmedFraction { width, dot } => {
                if *dot && !self.literal(".") {
                    Field::Nanosecond(0)
                } else {
                    Field::Nanosecond(nanoseconds(self.digits(0, *width)?))
                }
            }
            Token::AmPm(style) => {
                let designator = self.name(&[am_pm(false, *style), am_pm(true, *style)])?;
                Field::AmPm(designator == 1)
            }
            Token::Offset(style) => Field::Offset(self.offset(*style)?),
            Token::OffsetOrUtc => {
                if self.literal("Z") {
                    Field::Offset(0)
                } else if self.rest.starts_with(['+', '-']) {
                    Field::Offset(self.offset(OffsetStyle::Full)?)
                } else {
                    Field::Nothing
                }
            }
        })
    }

    fn literal(&mut self, text: &str) -> bool {
        match self.rest.strip_prefix(text) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn number(&mut self, pad: Pad) -> Option<i64> {
        let min = match pad {
            Pad::None => 1,
            Pad::Zero => 2,
        };
        self.digits(min, 2).map(|(value, _)| value)
    }

    /// Consumes `min` to `max` ASCII digits and returns their value and count.
    fn digits(&mut self, min: usize, max: usize) -> Option<(i64, usize)> {
        let count = self
            .rest
            .bytes()
            .take(max)
            .take_while(u8::is_ascii_digit)
            .count();
        if count < min {
            return None;
        }
        let (digits, rest) = self.rest.split_at(count);
        self.rest = rest;
        let value = digits
            .bytes()
            .fold(0, |value, digit| value * 10 + i64::from(digit - b'0'));
        Some((value, count))
    }

    /// Matches one of `names`, ignoring ASCII case, and returns its index.
    fn name(&mut self, names: &[&str]) -> Option<usize> {
        let index = names.iter().position(|name| {
            self.rest
                .get(..name.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        })?;
        self.rest = &self.rest[names[index].len()..];
        Some(index)
    }

    /// Returns the offset in seconds.
    fn offset(&mut self, style: OffsetStyle) -> Option<i64> {
        let sign = if self.literal("+") {
            1
        } else if self.literal("-") {
            -1
        } else {
            return None;
        };
        let (hours, minutes) = match style {
            OffsetStyle::Hours => (self.digits(1, 2)?.0, 0),
            OffsetStyle::PaddedHours => (self.digits(2, 2)?.0, 0),
            OffsetStyle::Full => {
                let hours = self.digits(2, 2)?.0;
                if !self.literal(":") {
                    return None;
                }
                (hours, self.digits(2, 2)?.0)
            }
        };
        (hours < 24 && minutes < 60).then_some(sign * (hours * 3600 + minutes * 60))
    }
}

fn two_digit_year(value: i64) -> i64 {
    let year = TWO_DIGIT_YEAR_MAX / 100 * 100 + value;
    if year > TWO_DIGIT_YEAR_MAX {
        year - 100
    } else {
        year
    }
}

fn nanoseconds((value, count): (i64, usize)) -> i64 {
    value * 10_i64.pow(9 - count as u32)
}
