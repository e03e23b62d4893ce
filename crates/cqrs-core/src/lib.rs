//! Read-side engine for CQRS: entity hierarchies, derived and
//! polymorphic-aware serializers, document collections, and the backends
//! they are denormalized into.

pub mod backend;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod serializer;
pub mod startup;
pub mod sync;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::Error;
pub use startup::start;

///
/// CONSTANTS
///

/// Primary key field present on every encoded record.
pub const ID_FIELD: &str = "id";

/// Discriminator field present on every polymorphic record.
pub const TYPE_FIELD: &str = "type";

/// Field names no entity or serializer may declare.
pub const RESERVED_FIELDS: [&str; 2] = [ID_FIELD, TYPE_FIELD];

///
/// Prelude
///
/// Declaration vocabulary and the instance trait.
///

pub mod prelude {
    pub use crate::{
        collection::CollectionDef,
        model::{EntityDecl, EntityMarker, FieldKind, FieldModel, Instance},
        serializer::{DeclaredField, SerializerDef},
        startup::App,
        traits::EntityInstance,
        value::{Record, Value},
    };
}
