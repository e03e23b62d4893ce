use crate::model::{EntityMarker, FieldKind};
use derive_more::Display;

///
/// SerializerId
///
/// Arena index of a constructed serializer. The two root sentinels occupy
/// fixed slots in every registry.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("serializer#{_0}")]
pub struct SerializerId(pub(crate) u32);

impl SerializerId {
    pub const PLAIN_ROOT: Self = Self(0);
    pub const POLYMORPHIC_ROOT: Self = Self(1);

    /// Root sentinel for a marker family.
    #[must_use]
    pub const fn root(marker: EntityMarker) -> Self {
        match marker {
            EntityMarker::Plain => Self::PLAIN_ROOT,
            EntityMarker::Polymorphic => Self::POLYMORPHIC_ROOT,
        }
    }

    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == Self::PLAIN_ROOT.0 || self.0 == Self::POLYMORPHIC_ROOT.0
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

///
/// SerializerMeta
///
/// Per-serializer options. `fields` and `exclude` only ever apply to the
/// serializer's local contribution, never to inherited fields.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerializerMeta {
    /// Target entity path.
    pub model: String,
    /// Allow-list over local fields, in output order.
    pub fields: Option<Vec<String>>,
    /// Deny-list over local fields.
    pub exclude: Option<Vec<String>>,
}

impl SerializerMeta {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fields: None,
            exclude: None,
        }
    }
}

///
/// DeclaredField
///
/// A field declared directly on a serializer rather than taken from the
/// model, e.g. a computed read-only value.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeclaredField {
    pub name: String,
    pub kind: FieldKind,
    /// Instance attribute to read; defaults to `name`.
    pub source: Option<String>,
    pub read_only: bool,
}

impl DeclaredField {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source: None,
            read_only: false,
        }
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Attribute read on encode.
    #[must_use]
    pub fn source_attr(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

///
/// SerializerDef
///
/// Declaration of a serializer, authored by hand or synthesized by
/// derivation. Two definitions are identical when every part compares equal.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerializerDef {
    pub name: String,
    pub base: SerializerId,
    pub meta: SerializerMeta,
    pub declared: Vec<DeclaredField>,
}

impl SerializerDef {
    #[must_use]
    pub fn new(name: impl Into<String>, base: SerializerId, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base,
            meta: SerializerMeta::new(model),
            declared: Vec::new(),
        }
    }

    /// Definition based on the plain root sentinel.
    #[must_use]
    pub fn plain(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, SerializerId::PLAIN_ROOT, model)
    }

    /// Definition based on the polymorphic root sentinel; the base is
    /// substituted with the nearest concrete ancestor's serializer when
    /// prepared.
    #[must_use]
    pub fn polymorphic(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(name, SerializerId::POLYMORPHIC_ROOT, model)
    }

    /// Synthesized definition: nothing but the model binding and the base.
    #[must_use]
    pub fn derived(entity_name: &str, base: SerializerId, model: impl Into<String>) -> Self {
        Self::new(derived_name(entity_name), base, model)
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.exclude = Some(exclude.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn declare(mut self, field: DeclaredField) -> Self {
        self.declared.push(field);
        self
    }

    #[must_use]
    pub const fn with_base(mut self, base: SerializerId) -> Self {
        self.base = base;
        self
    }
}

/// Name given to a synthesized serializer.
#[must_use]
pub fn derived_name(entity_name: &str) -> String {
    format!("{entity_name}AutoSerializer")
}
