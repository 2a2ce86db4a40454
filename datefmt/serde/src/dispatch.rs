use std::any::{self, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::{ArgumentNullSnafu, Codec, Error, UnsupportedTypeSnafu, ValueKind};

/// Runtime description of a property type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.name).finish()
    }
}

// `type_name` is not guaranteed to be unique, so only the id takes part in comparisons.
impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Builds the codec for the given property type.
///
/// Exactly eight types are supported: `NaiveDateTime`, `DateTime<FixedOffset>`, `NaiveDate`,
/// `NaiveTime`, and their `Option` counterparts.
pub fn create_codec(type_: Option<&TypeDescriptor>, format: &str) -> Result<Codec, Error> {
    let type_ = type_.context(ArgumentNullSnafu { name: "type" })?;
    let kind = ValueKind::ALL
        .into_iter()
        .find(|kind| kind.type_descriptor() == *type_)
        .context(UnsupportedTypeSnafu {
            type_name: type_.name(),
            dispatcher: dispatcher_name(),
        })?;
    Codec::new(kind, format)
}

fn dispatcher_name() -> &'static str {
    any::type_name_of_val(&create_codec)
}

/// Annotation that carries a format and builds the codec for whatever property it is attached to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterAnnotation {
    format: String,
}

impl ConverterAnnotation {
    pub fn new<T>(format: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn create_codec(&self, type_: Option<&TypeDescriptor>) -> Result<Codec, Error> {
        create_codec(type_, &self.format)
    }
}

/// Codec configuration, e.g., loaded from a config file.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    pub format: String,
    pub kind: ValueKind,
}

impl CodecConfig {
    pub fn build(&self) -> Result<Codec, Error> {
        Codec::new(self.kind, &self.format)
    }
}
