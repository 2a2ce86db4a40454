//! Metadata Resolver
//!
//! Given the type metadata produced by some source (a registry, generated code, etc.), the
//! resolver attaches a format-bound codec to every property that is marked with a date/time
//! format.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::{Codec, ConverterAnnotation, Error, TypeDescriptor, create_codec};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Marker {
    /// Plain format marker.
    Format(String),
    Converter(ConverterAnnotation),
    /// Markers that are irrelevant to date/time codecs.
    Other(Cow<'static, str>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyMetadata {
    name: Cow<'static, str>,
    value_type: Option<TypeDescriptor>,
    markers: Vec<Marker>,
    codec: Option<Codec>,
}

impl PropertyMetadata {
    pub fn new<N>(name: N, value_type: Option<TypeDescriptor>) -> Self
    where
        N: Into<Cow<'static, str>>,
    {
        Self {
            name: name.into(),
            value_type,
            markers: Vec::new(),
            codec: None,
        }
    }

    pub fn of<T, N>(name: N) -> Self
    where
        T: 'static,
        N: Into<Cow<'static, str>>,
    {
        Self::new(name, Some(TypeDescriptor::of::<T>()))
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Sets the codec that the property uses unless a marker overrides it.
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> Option<&TypeDescriptor> {
        self.value_type.as_ref()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn codec(&self) -> Option<&Codec> {
        self.codec.as_ref()
    }

    fn marked_codec(&self) -> Result<Option<Codec>, Error> {
        let format = self.markers.iter().find_map(|marker| match marker {
            Marker::Format(format) => Some(format),
            _ => None,
        });
        if let Some(format) = format {
            return create_codec(self.value_type(), format).map(Some);
        }

        let annotation = self.markers.iter().find_map(|marker| match marker {
            Marker::Converter(annotation) => Some(annotation),
            _ => None,
        });
        annotation
            .map(|annotation| annotation.create_codec(self.value_type()))
            .transpose()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeMetadata {
    type_: TypeDescriptor,
    properties: Vec<PropertyMetadata>,
}

impl TypeMetadata {
    pub fn new(type_: TypeDescriptor) -> Self {
        Self {
            type_,
            properties: Vec::new(),
        }
    }

    pub fn of<T>() -> Self
    where
        T: 'static,
    {
        Self::new(TypeDescriptor::of::<T>())
    }

    pub fn with_property(mut self, property: PropertyMetadata) -> Self {
        self.properties.push(property);
        self
    }

    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.type_
    }

    pub fn properties(&self) -> &[PropertyMetadata] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties
            .iter()
            .find(|property| property.name() == name)
    }
}

/// Type metadata keyed by type.
#[derive(Clone, Debug, Default)]
pub struct MetadataRegistry {
    types: HashMap<TypeId, TypeMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metadata: TypeMetadata) -> Option<TypeMetadata> {
        self.types.insert(metadata.type_.id(), metadata)
    }

    pub fn get(&self, type_id: TypeId) -> Option<TypeMetadata> {
        self.types.get(&type_id).cloned()
    }
}

pub struct Resolver<F = fn(TypeId) -> Option<TypeMetadata>> {
    inner: Option<F>,
}

impl Resolver {
    /// Creates a resolver that has no metadata source.
    pub fn empty() -> Self {
        Self { inner: None }
    }
}

impl<F> fmt::Debug for Resolver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("inner", &self.inner.as_ref().map(|_| "..."))
            .finish()
    }
}

impl<F> Resolver<F>
where
    F: Fn(TypeId) -> Option<TypeMetadata>,
{
    pub fn new(inner: F) -> Self {
        Self { inner: Some(inner) }
    }

    /// Returns the metadata of `type_id`, with a codec attached to every marked property.
    ///
    /// When a property carries both a `Marker::Format` and a `Marker::Converter`, the former takes
    /// precedence.  Properties without either marker are left unchanged.
    pub fn resolve(&self, type_id: TypeId) -> Result<Option<TypeMetadata>, Error> {
        let Some(mut metadata) = self.inner.as_ref().and_then(|inner| inner(type_id)) else {
            return Ok(None);
        };
        for property in &mut metadata.properties {
            if let Some(codec) = property.marked_codec()? {
                tracing::debug!(
                    type_name = metadata.type_.name(),
                    property = %property.name,
                    kind = %codec.kind(),
                    format = codec.format(),
                    "override codec"
                );
                property.codec = Some(codec);
            }
        }
        Ok(Some(metadata))
    }

    pub fn resolve_type<T>(&self) -> Result<Option<TypeMetadata>, Error>
    where
        T: ?Sized + 'static,
    {
        self.resolve(TypeId::of::<T>())
    }
}
