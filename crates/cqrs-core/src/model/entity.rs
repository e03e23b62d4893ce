use crate::model::field::FieldModel;
use derive_more::Display;

///
/// EntityId
/// Arena index of a declared entity.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("entity#{_0}")]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

///
/// EntityMarker
///
/// The two marker bases that make an entity eligible for a derived
/// read-side representation. Polymorphic entities are fetched as their
/// most-refined subtype.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum EntityMarker {
    #[display("CqrsModel")]
    Plain,
    #[display("CqrsPolymorphicModel")]
    Polymorphic,
}

///
/// EntityOptions
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EntityOptions {
    pub is_abstract: bool,
    pub is_proxy: bool,
}

///
/// EntityParent
/// A resolved, declared base of an entity.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityParent {
    Marker(EntityMarker),
    Model(EntityId),
}

///
/// EntityBase
/// A base as written in a declaration, before resolution.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntityBase {
    Marker(EntityMarker),
    Model(String),
}

///
/// EntityModel
/// Declared runtime model for one entity class.
///

#[derive(Clone, Debug)]
pub struct EntityModel {
    pub id: EntityId,
    /// Application the entity belongs to (used for collection naming).
    pub app_label: String,
    /// Module the entity is declared in.
    pub module: String,
    /// Class name.
    pub name: String,
    pub options: EntityOptions,
    /// Declared bases, nearest first in declaration order.
    pub parents: Vec<EntityParent>,
    /// Locally declared fields, including non-CQRS mixins declared inline.
    pub fields: Vec<FieldModel>,
}

impl EntityModel {
    /// Fully-qualified dotted path, e.g. `shop.models.Book`.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Concrete entities are neither abstract nor proxies.
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        !self.options.is_abstract && !self.options.is_proxy
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Models declared directly as bases.
    pub fn parent_models(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.parents.iter().filter_map(|parent| match parent {
            EntityParent::Model(id) => Some(*id),
            EntityParent::Marker(_) => None,
        })
    }
}

///
/// EntityDecl
///
/// Declaration of an entity class, consumed by `EntityRegistry::declare`.
/// Bases are referenced by path and must be declared first.
///

#[derive(Clone, Debug)]
pub struct EntityDecl {
    pub app_label: String,
    pub module: String,
    pub name: String,
    pub options: EntityOptions,
    pub bases: Vec<EntityBase>,
    pub fields: Vec<FieldModel>,
}

impl EntityDecl {
    #[must_use]
    pub fn new(
        app_label: impl Into<String>,
        module: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            app_label: app_label.into(),
            module: module.into(),
            name: name.into(),
            options: EntityOptions::default(),
            bases: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Add a marker base (`CqrsModel` / `CqrsPolymorphicModel`).
    #[must_use]
    pub fn marker(mut self, marker: EntityMarker) -> Self {
        self.bases.push(EntityBase::Marker(marker));
        self
    }

    /// Add a model base by path.
    #[must_use]
    pub fn base(mut self, path: impl Into<String>) -> Self {
        self.bases.push(EntityBase::Model(path.into()));
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldModel>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub const fn abstract_model(mut self) -> Self {
        self.options.is_abstract = true;
        self
    }

    #[must_use]
    pub const fn proxy(mut self) -> Self {
        self.options.is_proxy = true;
        self
    }
}
