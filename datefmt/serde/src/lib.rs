//! Format-bound date/time codecs for `serde`.
//!
//! A codec converts one of eight temporal types (`NaiveDateTime`, `DateTime<FixedOffset>`,
//! `NaiveDate`, `NaiveTime`, and their `Option` counterparts) to and from a string token in a fixed
//! custom pattern, such as `yyyy-MM-dd`.
//!
//! Reading is asymmetric:
//!
//! * A required value is parsed against the pattern first, and when that fails, as a standard
//!   ISO 8601 string.  If both fail, the read fails.
//! * An optional value is parsed against the pattern only.  `null`, non-string tokens, and
//!   mismatched strings all read as `None`.

mod codec;
mod dispatch;
mod resolve;
mod with;

use snafu::prelude::*;

pub use datefmt_serde_attribute::date_time;
pub use g1_chrono::{Pattern, TemporalKind};

pub use crate::codec::{Codec, FormatCodec, FormatValue, Formatted, Value, ValueKind};
pub use crate::dispatch::{CodecConfig, ConverterAnnotation, TypeDescriptor, create_codec};
pub use crate::resolve::{Marker, MetadataRegistry, PropertyMetadata, Resolver, TypeMetadata};
pub use crate::with::{DateTimeFormat, FormatCell, FormatWith};

#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{name} argument is absent"))]
    ArgumentNull { name: &'static str },
    #[snafu(display("{type_name} is not supported by the {dispatcher}"))]
    UnsupportedType {
        type_name: &'static str,
        dispatcher: &'static str,
    },
    #[snafu(display("invalid date/time format: {source}"))]
    Pattern { source: g1_chrono::Error },
}
