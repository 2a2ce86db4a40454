use std::marker::PhantomData;
use std::sync::OnceLock;

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use snafu::prelude::*;

use g1_chrono::Pattern;

use crate::{Error, FormatCodec, FormatValue, PatternSnafu};

/// Binds a format string to a type so that it can be named in `#[serde(with = "...")]`.
///
/// The `date_time` attribute macro generates implementations of this trait; implement it by hand
/// when annotating fields with `#[serde(with = "datefmt_serde::FormatWith::<MyFormat>")]`
/// directly.
pub trait DateTimeFormat {
    const FORMAT: &'static str;

    /// Returns the cell that holds the compiled `FORMAT`.  Every implementation must return its
    /// own `static`.
    fn cell() -> &'static FormatCell;

    fn pattern() -> Result<Pattern, Error> {
        Self::cell().get_or_compile(Self::FORMAT)
    }
}

/// Compiles a format on first use and keeps the result, error included.
#[derive(Debug, Default)]
pub struct FormatCell(OnceLock<Result<Pattern, Error>>);

impl FormatCell {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn get(&self) -> Option<&Result<Pattern, Error>> {
        self.0.get()
    }

    pub fn get_or_compile(&self, format: &str) -> Result<Pattern, Error> {
        self.0
            .get_or_init(|| Pattern::new(format).context(PatternSnafu))
            .clone()
    }
}

/// `serde` "with" module for fields of any type that implements `FormatValue`.
pub struct FormatWith<F>(PhantomData<F>);

impl<F> FormatWith<F>
where
    F: DateTimeFormat,
{
    fn codec<T>() -> Result<FormatCodec<T>, Error> {
        F::pattern().map(FormatCodec::from_pattern)
    }

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: FormatValue,
        S: Serializer,
    {
        Self::codec::<T>()
            .map_err(ser::Error::custom)?
            .write(value, serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FormatValue,
        D: Deserializer<'de>,
    {
        Self::codec::<T>()
            .map_err(de::Error::custom)?
            .read(deserializer)
    }
}
