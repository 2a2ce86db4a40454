mod iso8601;
mod pattern;
mod render;
mod scan;

use std::fmt;

use chrono::format::{ParseError, ParseErrorKind, Parsed};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use snafu::prelude::*;

pub use crate::pattern::Pattern;

use crate::render::Fields;

#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    //
    // Pattern errors.
    //
    #[snafu(display("empty date/time pattern"))]
    Empty,
    #[snafu(display("unsupported format specifier \"{specifier}\" in pattern: {pattern:?}"))]
    UnsupportedSpecifier { pattern: String, specifier: String },
    #[snafu(display("unterminated quote in pattern: {pattern:?}"))]
    UnterminatedQuote { pattern: String },
    #[snafu(display("trailing escape character in pattern: {pattern:?}"))]
    TrailingEscape { pattern: String },

    //
    // Value errors.
    //
    #[snafu(display("{kind} cannot be formatted with pattern: {pattern:?}"))]
    Format { kind: TemporalKind, pattern: String },
    #[snafu(display("{input:?} does not match pattern {pattern:?} at offset {position}"))]
    Mismatch {
        input: String,
        pattern: String,
        position: usize,
    },
    #[snafu(display("{input:?} is not a valid date/time for pattern {pattern:?}: {source}"))]
    Invalid {
        input: String,
        pattern: String,
        source: ParseError,
    },
    #[snafu(display("{input:?} is out of range for pattern {pattern:?}"))]
    OutOfRange { input: String, pattern: String },
    #[snafu(display("not an iso 8601 {kind}: {input:?}"))]
    Iso8601 { kind: TemporalKind, input: String },
}

/// The shape of a temporal value, independent of whether a value is required or optional.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TemporalKind {
    /// Calendar date and clock time without offset.
    Instant,
    /// Calendar date and clock time with a UTC offset.
    OffsetInstant,
    Date,
    Time,
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instant => "instant",
            Self::OffsetInstant => "offset instant",
            Self::Date => "date",
            Self::Time => "time",
        })
    }
}

/// Pattern-driven formatting and parsing of a `chrono` value.
pub trait Temporal: Sized {
    const KIND: TemporalKind;

    fn format_with(&self, pattern: &Pattern) -> Result<String, Error>;

    /// Parses the whole `input` strictly against `pattern`.
    fn parse_exact(input: &str, pattern: &Pattern) -> Result<Self, Error>;

    /// Parses a standard ISO 8601 representation, regardless of any pattern.
    fn parse_iso8601(input: &str) -> Result<Self, Error>;
}

impl Temporal for NaiveDateTime {
    const KIND: TemporalKind = TemporalKind::Instant;

    fn format_with(&self, pattern: &Pattern) -> Result<String, Error> {
        let fields = Fields {
            date: Some(self.date()),
            time: Some(self.time()),
            offset: None,
        };
        format_fields(&fields, Self::KIND, pattern)
    }

    fn parse_exact(input: &str, pattern: &Pattern) -> Result<Self, Error> {
        to_naive_date_time(&scan::scan(input, pattern)?)
            .context(InvalidSnafu { input, pattern: pattern.as_str() })
    }

    fn parse_iso8601(input: &str) -> Result<Self, Error> {
        iso8601::parse(input)
            .map(iso8601::Iso8601::naive_utc)
            .context(Iso8601Snafu { kind: Self::KIND, input })
    }
}

impl Temporal for DateTime<FixedOffset> {
    const KIND: TemporalKind = TemporalKind::OffsetInstant;

    fn format_with(&self, pattern: &Pattern) -> Result<String, Error> {
        let local = self.naive_local();
        let fields = Fields {
            date: Some(local.date()),
            time: Some(local.time()),
            offset: Some(*self.offset()),
        };
        format_fields(&fields, Self::KIND, pattern)
    }

    fn parse_exact(input: &str, pattern: &Pattern) -> Result<Self, Error> {
        let parsed = scan::scan(input, pattern)?;
        let naive =
            to_naive_date_time(&parsed).context(InvalidSnafu { input, pattern: pattern.as_str() })?;
        // A pattern without an offset field yields UTC.
        let offset = match parsed.to_fixed_offset() {
            Ok(offset) => offset,
            Err(error) if error.kind() == ParseErrorKind::NotEnough => Utc.fix(),
            Err(error) => {
                return Err(error).context(InvalidSnafu { input, pattern: pattern.as_str() });
            }
        };
        naive
            .and_local_timezone(offset)
            .single()
            .context(OutOfRangeSnafu { input, pattern: pattern.as_str() })
    }

    fn parse_iso8601(input: &str) -> Result<Self, Error> {
        iso8601::parse(input)
            .map(iso8601::Iso8601::fixed_offset)
            .context(Iso8601Snafu { kind: Self::KIND, input })
    }
}

impl Temporal for NaiveDate {
    const KIND: TemporalKind = TemporalKind::Date;

    fn format_with(&self, pattern: &Pattern) -> Result<String, Error> {
        let fields = Fields {
            date: Some(*self),
            ..Fields::default()
        };
        format_fields(&fields, Self::KIND, pattern)
    }

    fn parse_exact(input: &str, pattern: &Pattern) -> Result<Self, Error> {
        scan::scan(input, pattern)?
            .to_naive_date()
            .context(InvalidSnafu { input, pattern: pattern.as_str() })
    }

    fn parse_iso8601(input: &str) -> Result<Self, Error> {
        iso8601::parse(input)
            .map(|stamp| stamp.naive_utc().date())
            .context(Iso8601Snafu { kind: Self::KIND, input })
    }
}

impl Temporal for NaiveTime {
    const KIND: TemporalKind = TemporalKind::Time;

    fn format_with(&self, pattern: &Pattern) -> Result<String, Error> {
        let fields = Fields {
            time: Some(*self),
            ..Fields::default()
        };
        format_fields(&fields, Self::KIND, pattern)
    }

    fn parse_exact(input: &str, pattern: &Pattern) -> Result<Self, Error> {
        to_naive_time(&scan::scan(input, pattern)?)
            .context(InvalidSnafu { input, pattern: pattern.as_str() })
    }

    fn parse_iso8601(input: &str) -> Result<Self, Error> {
        iso8601::parse(input)
            .map(|stamp| stamp.naive_utc().time())
            .context(Iso8601Snafu { kind: Self::KIND, input })
    }
}

fn format_fields(fields: &Fields, kind: TemporalKind, pattern: &Pattern) -> Result<String, Error> {
    render::render(pattern, fields).context(FormatSnafu { kind, pattern: pattern.as_str() })
}

fn to_naive_date_time(parsed: &Parsed) -> Result<NaiveDateTime, ParseError> {
    Ok(parsed.to_naive_date()?.and_time(to_naive_time(parsed)?))
}

/// Resolves the clock time, treating absent hour and minute fields as zero and a 12-hour clock
/// without an AM/PM designator as AM.
fn to_naive_time(parsed: &Parsed) -> Result<NaiveTime, ParseError> {
    match parsed.to_naive_time() {
        Err(error) if error.kind() == ParseErrorKind::NotEnough => {
            let mut parsed = parsed.clone();
            // Setting a field that is already present fails and keeps the parsed value.
            let _ = parsed.set_ampm(false);
            let _ = parsed.set_minute(0);
            let _ = parsed.set_hour(0);
            parsed.to_naive_time()
        }
        result => result,
    }
}
