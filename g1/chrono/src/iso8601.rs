use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Result of the format-agnostic fallback parse.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Iso8601 {
    Offset(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub(crate) fn parse(input: &str) -> Option<Iso8601> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
        return Some(Iso8601::Offset(date_time));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(Iso8601::Naive)
}

impl Iso8601 {
    /// Offsets are normalized to UTC.
    pub(crate) fn naive_utc(self) -> NaiveDateTime {
        match self {
            Self::Offset(date_time) => date_time.naive_utc(),
            Self::Naive(date_time) => date_time,
        }
    }

    /// Naive stamps are taken as UTC.
    pub(crate) fn fixed_offset(self) -> DateTime<FixedOffset> {
        match self {
            Self::Offset(date_time) => date_time,
            Self::Naive(date_time) => date_time.and_utc().fixed_offset(),
        }
    }
}
