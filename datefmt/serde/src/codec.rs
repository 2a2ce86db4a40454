use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::{
    self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Unexpected, Visitor,
};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use g1_chrono::{Pattern, Temporal, TemporalKind};

use crate::{Error, PatternSnafu, TypeDescriptor};

/// Which value a codec converts: one of four temporal shapes, either required or optional.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    RequiredInstant,
    OptionalInstant,
    RequiredOffsetInstant,
    OptionalOffsetInstant,
    RequiredDate,
    OptionalDate,
    RequiredTime,
    OptionalTime,
}

impl ValueKind {
    pub const ALL: [Self; 8] = [
        Self::RequiredInstant,
        Self::OptionalInstant,
        Self::RequiredOffsetInstant,
        Self::OptionalOffsetInstant,
        Self::RequiredDate,
        Self::OptionalDate,
        Self::RequiredTime,
        Self::OptionalTime,
    ];

    pub const fn new(temporal: TemporalKind, optional: bool) -> Self {
        match (temporal, optional) {
            (TemporalKind::Instant, false) => Self::RequiredInstant,
            (TemporalKind::Instant, true) => Self::OptionalInstant,
            (TemporalKind::OffsetInstant, false) => Self::RequiredOffsetInstant,
            (TemporalKind::OffsetInstant, true) => Self::OptionalOffsetInstant,
            (TemporalKind::Date, false) => Self::RequiredDate,
            (TemporalKind::Date, true) => Self::OptionalDate,
            (TemporalKind::Time, false) => Self::RequiredTime,
            (TemporalKind::Time, true) => Self::OptionalTime,
        }
    }

    pub const fn temporal(self) -> TemporalKind {
        match self {
            Self::RequiredInstant | Self::OptionalInstant => TemporalKind::Instant,
            Self::RequiredOffsetInstant | Self::OptionalOffsetInstant => {
                TemporalKind::OffsetInstant
            }
            Self::RequiredDate | Self::OptionalDate => TemporalKind::Date,
            Self::RequiredTime | Self::OptionalTime => TemporalKind::Time,
        }
    }

    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Self::OptionalInstant
                | Self::OptionalOffsetInstant
                | Self::OptionalDate
                | Self::OptionalTime,
        )
    }

    /// The Rust type a codec of this kind reads and writes.
    pub fn type_descriptor(self) -> TypeDescriptor {
        match self {
            Self::RequiredInstant => TypeDescriptor::of::<NaiveDateTime>(),
            Self::OptionalInstant => TypeDescriptor::of::<Option<NaiveDateTime>>(),
            Self::RequiredOffsetInstant => TypeDescriptor::of::<DateTime<FixedOffset>>(),
            Self::OptionalOffsetInstant => TypeDescriptor::of::<Option<DateTime<FixedOffset>>>(),
            Self::RequiredDate => TypeDescriptor::of::<NaiveDate>(),
            Self::OptionalDate => TypeDescriptor::of::<Option<NaiveDate>>(),
            Self::RequiredTime => TypeDescriptor::of::<NaiveTime>(),
            Self::OptionalTime => TypeDescriptor::of::<Option<NaiveTime>>(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let presence = if self.is_optional() {
            "optional"
        } else {
            "required"
        };
        write!(f, "{presence} {}", self.temporal())
    }
}

/// Type-erased temporal value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Value {
    Instant(NaiveDateTime),
    OffsetInstant(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Value {
    pub fn kind(&self) -> TemporalKind {
        match self {
            Self::Instant(_) => TemporalKind::Instant,
            Self::OffsetInstant(_) => TemporalKind::OffsetInstant,
            Self::Date(_) => TemporalKind::Date,
            Self::Time(_) => TemporalKind::Time,
        }
    }
}

/// Implemented by exactly the eight types a codec can convert.
pub trait FormatValue: Sized + 'static {
    const KIND: ValueKind;

    fn write_with<S>(&self, pattern: &Pattern, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;

    fn read_with<'de, D>(pattern: &Pattern, deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>;

    #[doc(hidden)]
    fn into_codec(codec: FormatCodec<Self>) -> Codec;

    #[doc(hidden)]
    fn from_codec(codec: &Codec) -> Option<&FormatCodec<Self>>;
}

macro_rules! impl_format_value {
    ($type:ty, $required:ident, $optional:ident $(,)?) => {
        impl FormatValue for $type {
            const KIND: ValueKind = ValueKind::$required;

            fn write_with<S>(&self, pattern: &Pattern, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                write_required(self, pattern, serializer)
            }

            fn read_with<'de, D>(pattern: &Pattern, deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_str(RequiredVisitor::new(pattern))
            }

            fn into_codec(codec: FormatCodec<Self>) -> Codec {
                Codec::$required(codec)
            }

            fn from_codec(codec: &Codec) -> Option<&FormatCodec<Self>> {
                match codec {
                    Codec::$required(codec) => Some(codec),
                    _ => None,
                }
            }
        }

        impl FormatValue for Option<$type> {
            const KIND: ValueKind = ValueKind::$optional;

            fn write_with<S>(&self, pattern: &Pattern, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                match self {
                    Some(value) => write_required(value, pattern, serializer),
                    None => serializer.serialize_none(),
                }
            }

            fn read_with<'de, D>(pattern: &Pattern, deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                deserializer.deserialize_option(OptionalVisitor::new(pattern))
            }

            fn into_codec(codec: FormatCodec<Self>) -> Codec {
                Codec::$optional(codec)
            }

            fn from_codec(codec: &Codec) -> Option<&FormatCodec<Self>> {
                match codec {
                    Codec::$optional(codec) => Some(codec),
                    _ => None,
                }
            }
        }
    };
}

impl_format_value!(NaiveDateTime, RequiredInstant, OptionalInstant);
impl_format_value!(
    DateTime<FixedOffset>,
    RequiredOffsetInstant,
    OptionalOffsetInstant,
);
impl_format_value!(NaiveDate, RequiredDate, OptionalDate);
impl_format_value!(NaiveTime, RequiredTime, OptionalTime);

fn write_required<T, S>(value: &T, pattern: &Pattern, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Temporal,
    S: Serializer,
{
    serializer.serialize_str(&value.format_with(pattern).map_err(ser::Error::custom)?)
}

/// Reads a string token: exact match first, then the ISO 8601 fallback.
struct RequiredVisitor<'a, T> {
    pattern: &'a Pattern,
    _value: PhantomData<fn() -> T>,
}

impl<'a, T> RequiredVisitor<'a, T> {
    fn new(pattern: &'a Pattern) -> Self {
        Self {
            pattern,
            _value: PhantomData,
        }
    }
}

impl<'de, T> Visitor<'de> for RequiredVisitor<'_, T>
where
    T: Temporal,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} string in format {:?}", T::KIND, self.pattern.as_str())
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        T::parse_exact(value, self.pattern).or_else(|error| {
            tracing::trace!(%error, "fall back to iso 8601");
            T::parse_iso8601(value).map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
        })
    }
}

/// Reads a nullable token.  Unlike `RequiredVisitor`, there is no fallback: anything that does not
/// match the pattern exactly reads as `None`.
struct OptionalVisitor<'a, T> {
    pattern: &'a Pattern,
    _value: PhantomData<fn() -> T>,
}

impl<'a, T> OptionalVisitor<'a, T> {
    fn new(pattern: &'a Pattern) -> Self {
        Self {
            pattern,
            _value: PhantomData,
        }
    }
}

impl<'de, T> Visitor<'de> for OptionalVisitor<'_, T>
where
    T: Temporal,
{
    type Value = Option<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "null or {} string in format {:?}",
            T::KIND,
            self.pattern.as_str(),
        )
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(T::parse_exact(value, self.pattern).ok())
    }

    //
    // Any other token reads as `None`.
    //

    fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_i64<E>(self, _: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_u64<E>(self, _: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_f64<E>(self, _: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_bytes<E>(self, _: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(None)
    }
}

/// Format-bound codec of one concrete value type.
pub struct FormatCodec<T> {
    pattern: Pattern,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for FormatCodec<T> {
    fn clone(&self) -> Self {
        Self::from_pattern(self.pattern.clone())
    }
}

impl<T> fmt::Debug for FormatCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatCodec")
            .field("type", &std::any::type_name::<T>())
            .field("format", &self.pattern.as_str())
            .finish()
    }
}

impl<T> PartialEq for FormatCodec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl<T> FormatCodec<T> {
    pub fn from_pattern(pattern: Pattern) -> Self {
        Self {
            pattern,
            _value: PhantomData,
        }
    }

    pub fn format(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }
}

impl<T> FormatCodec<T>
where
    T: FormatValue,
{
    pub fn new(format: &str) -> Result<Self, Error> {
        Pattern::new(format)
            .map(Self::from_pattern)
            .context(PatternSnafu)
    }

    pub fn kind(&self) -> ValueKind {
        T::KIND
    }

    pub fn write<S>(&self, value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.write_with(&self.pattern, serializer)
    }

    pub fn read<'de, D>(&self, deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::read_with(&self.pattern, deserializer)
    }

    /// Wraps `value` so that it serializes through this codec.
    pub fn formatted<'a>(&'a self, value: &'a T) -> Formatted<'a, T> {
        Formatted { codec: self, value }
    }
}

impl<'de, T> DeserializeSeed<'de> for &FormatCodec<T>
where
    T: FormatValue,
{
    type Value = T;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.read(deserializer)
    }
}

#[derive(Debug)]
pub struct Formatted<'a, T> {
    codec: &'a FormatCodec<T>,
    value: &'a T,
}

impl<T> Serialize for Formatted<'_, T>
where
    T: FormatValue,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.codec.write(self.value, serializer)
    }
}

/// Type-erased format-bound codec, as produced by the dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub enum Codec {
    RequiredInstant(FormatCodec<NaiveDateTime>),
    OptionalInstant(FormatCodec<Option<NaiveDateTime>>),
    RequiredOffsetInstant(FormatCodec<DateTime<FixedOffset>>),
    OptionalOffsetInstant(FormatCodec<Option<DateTime<FixedOffset>>>),
    RequiredDate(FormatCodec<NaiveDate>),
    OptionalDate(FormatCodec<Option<NaiveDate>>),
    RequiredTime(FormatCodec<NaiveTime>),
    OptionalTime(FormatCodec<Option<NaiveTime>>),
}

macro_rules! each_codec {
    ($codec:expr, $name:ident => $body:expr $(,)?) => {
        match $codec {
            Codec::RequiredInstant($name) => $body,
            Codec::OptionalInstant($name) => $body,
            Codec::RequiredOffsetInstant($name) => $body,
            Codec::OptionalOffsetInstant($name) => $body,
            Codec::RequiredDate($name) => $body,
            Codec::OptionalDate($name) => $body,
            Codec::RequiredTime($name) => $body,
            Codec::OptionalTime($name) => $body,
        }
    };
}

impl<T> From<FormatCodec<T>> for Codec
where
    T: FormatValue,
{
    fn from(codec: FormatCodec<T>) -> Self {
        T::into_codec(codec)
    }
}

impl Codec {
    pub fn new(kind: ValueKind, format: &str) -> Result<Self, Error> {
        let pattern = Pattern::new(format).context(PatternSnafu)?;
        Ok(match kind {
            ValueKind::RequiredInstant => Self::RequiredInstant(FormatCodec::from_pattern(pattern)),
            ValueKind::OptionalInstant => Self::OptionalInstant(FormatCodec::from_pattern(pattern)),
            ValueKind::RequiredOffsetInstant => {
                Self::RequiredOffsetInstant(FormatCodec::from_pattern(pattern))
            }
            ValueKind::OptionalOffsetInstant => {
                Self::OptionalOffsetInstant(FormatCodec::from_pattern(pattern))
            }
            ValueKind::RequiredDate => Self::RequiredDate(FormatCodec::from_pattern(pattern)),
            ValueKind::OptionalDate => Self::OptionalDate(FormatCodec::from_pattern(pattern)),
            ValueKind::RequiredTime => Self::RequiredTime(FormatCodec::from_pattern(pattern)),
            ValueKind::OptionalTime => Self::OptionalTime(FormatCodec::from_pattern(pattern)),
        })
    }

    pub fn kind(&self) -> ValueKind {
        each_codec!(self, codec => codec.kind())
    }

    pub fn format(&self) -> &str {
        each_codec!(self, codec => codec.format())
    }

    /// Recovers the typed codec; returns `None` when `T` is not the codec's value type.
    pub fn typed<T>(&self) -> Option<&FormatCodec<T>>
    where
        T: FormatValue,
    {
        T::from_codec(self)
    }

    /// Writes a type-erased value.  `None` is accepted only by optional codecs.
    pub fn write_value<S>(&self, value: Option<&Value>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match (self, value) {
            (Self::RequiredInstant(codec), Some(Value::Instant(value))) => {
                codec.write(value, serializer)
            }
            (Self::OptionalInstant(codec), Some(Value::Instant(value))) => {
                codec.write(&Some(*value), serializer)
            }
            (Self::RequiredOffsetInstant(codec), Some(Value::OffsetInstant(value))) => {
                codec.write(value, serializer)
            }
            (Self::OptionalOffsetInstant(codec), Some(Value::OffsetInstant(value))) => {
                codec.write(&Some(*value), serializer)
            }
            (Self::RequiredDate(codec), Some(Value::Date(value))) => codec.write(value, serializer),
            (Self::OptionalDate(codec), Some(Value::Date(value))) => {
                codec.write(&Some(*value), serializer)
            }
            (Self::RequiredTime(codec), Some(Value::Time(value))) => codec.write(value, serializer),
            (Self::OptionalTime(codec), Some(Value::Time(value))) => {
                codec.write(&Some(*value), serializer)
            }
            (codec, None) if codec.kind().is_optional() => serializer.serialize_none(),
            (codec, Some(value)) => Err(ser::Error::custom(std::format!(
                "{} codec cannot write {} value",
                codec.kind(),
                value.kind(),
            ))),
            (codec, None) => Err(ser::Error::custom(std::format!(
                "{} codec cannot write null",
                codec.kind(),
            ))),
        }
    }

    /// Reads a type-erased value.  Required codecs always return `Some`.
    pub fn read_value<'de, D>(&self, deserializer: D) -> Result<Option<Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match self {
            Self::RequiredInstant(codec) => Some(Value::Instant(codec.read(deserializer)?)),
            Self::OptionalInstant(codec) => codec.read(deserializer)?.map(Value::Instant),
            Self::RequiredOffsetInstant(codec) => {
                Some(Value::OffsetInstant(codec.read(deserializer)?))
            }
            Self::OptionalOffsetInstant(codec) => {
                codec.read(deserializer)?.map(Value::OffsetInstant)
            }
            Self::RequiredDate(codec) => Some(Value::Date(codec.read(deserializer)?)),
            Self::OptionalDate(codec) => codec.read(deserializer)?.map(Value::Date),
            Self::RequiredTime(codec) => Some(Value::Time(codec.read(deserializer)?)),
            Self::OptionalTime(codec) => codec.read(deserializer)?.map(Value::Time),
        })
    }
}
