use std::fmt::Write;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};

use crate::pattern::{Name, OffsetStyle, Pad, Pattern, Token};

pub(crate) const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub(crate) const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// English names abbreviate to their first three letters.
pub(crate) fn abbreviate(name: &'static str, style: Name) -> &'static str {
    match style {
        Name::Short => &name[..3],
        Name::Long => name,
    }
}

pub(crate) fn am_pm(pm: bool, style: Name) -> &'static str {
    match (pm, style) {
        (false, Name::Short) => "A",
        (false, Name::Long) => "AM",
        (true, Name::Short) => "P",
        (true, Name::Long) => "PM",
    }
}

/// The parts of a value that a pattern may refer to.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Fields {
    pub(crate) date: Option<NaiveDate>,
    pub(crate) time: Option<NaiveTime>,
    pub(crate) offset: Option<FixedOffset>,
}

/// Formats `fields`; returns `None` when the pattern refers to a part that `fields` lacks.
pub(crate) fn render(pattern: &Pattern, fields: &Fields) -> Option<String> {
    let mut output = String::new();
    for token in pattern.tokens() {
        match token {
            Token::Literal(text) => output.push_str(text),
            Token::ShortYear(pad) => number(&mut output, fields.date?.year().rem_euclid(100), *pad),
            Token::Year(width) => {
                let width = *width;
                write!(output, "{:0width$}", fields.date?.year()).ok()?;
            }
            Token::Month(pad) => number(&mut output, fields.date?.month(), *pad),
            Token::MonthName(style) => {
                output.push_str(abbreviate(MONTHS[fields.date?.month0() as usize], *style));
            }
            Token::Day(pad) => number(&mut output, fields.date?.day(), *pad),
            Token::WeekdayName(style) => {
                let weekday = fields.date?.weekday().num_days_from_monday();
                output.push_str(abbreviate(WEEKDAYS[weekday as usize], *style));
            }
            Token::Hour(pad) => number(&mut output, fields.time?.hour(), *pad),
            Token::Hour12(pad) => number(&mut output, fields.time?.hour12().1, *pad),
            Token::Minute(pad) => number(&mut output, fields.time?.minute(), *pad),
            Token::Second(pad) => number(&mut output, fields.time?.second(), *pad),
            Token::Fraction(width) => {
                output.push_str(&fraction(fields.time?, *width));
            }
            Token::TrimmedFraction { width, dot } => {
                let digits = fraction(fields.time?, *width);
                let digits = digits.trim_end_matches('0');
                if !digits.is_empty() {
                    if *dot {
                        output.push('.');
                    }
                    output.push_str(digits);
                }
            }
            Token::AmPm(style) => output.push_str(am_pm(fields.time?.hour() >= 12, *style)),
            Token::Offset(style) => offset(&mut output, fields.offset?, *style),
            Token::OffsetOrUtc => match fields.offset {
                Some(utc) if utc.local_minus_utc() == 0 => output.push('Z'),
                Some(other) => offset(&mut output, other, OffsetStyle::Full),
                None => {}
            },
        }
    }
    Some(output)
}

fn number<T>(output: &mut String, value: T, pad: Pad)
where
    T: Into<i64>,
{
    let value = value.into();
    match pad {
        Pad::None => output.push_str(&value.to_string()),
        Pad::Zero => output.push_str(&format!("{value:02}")),
    }
}

/// Truncates the nanoseconds (leap seconds excluded) to `width` digits.
fn fraction(time: NaiveTime, width: usize) -> String {
    let nanos = time.nanosecond() % 1_000_000_000;
    let digits = format!("{nanos:09}");
    digits[..width].to_string()
}

fn offset(output: &mut String, offset: FixedOffset, style: OffsetStyle) {
    let seconds = offset.local_minus_utc();
    output.push(if seconds < 0 { '-' } else { '+' });
    let hours = seconds.abs() / 3600;
    let minutes = seconds.abs() % 3600 / 60;
    output.push_str(&match style {
        OffsetStyle::Hours => hours.to_string(),
        OffsetStyle::PaddedHours => format!("{hours:02}"),
        OffsetStyle::Full => format!("{hours:02}:{minutes:02}"),
    });
}
