//! ## Crate layout
//! - `core`: entity registry, serializers, collections, backends and
//!   startup wiring.
//!
//! The `prelude` module carries the declaration vocabulary used by apps.

pub use cqrs_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::{Error, start};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        backend::{Backend, MemoryBackend, OpLogBackend},
        collection::CollectionDef,
        config::CqrsConfig,
        model::{EntityDecl, EntityMarker, FieldKind, FieldModel, Instance},
        serializer::{DeclaredField, SerializerDef, SerializerId},
        startup::{App, Runtime},
        sync::Denormalizer,
        traits::EntityInstance,
        value::{Record, Value},
    };
    pub use serde::{Deserialize, Serialize};
}
