//! Runtime entity model: declared entities, their fields, the inheritance
//! arena, and the per-level field contribution.

pub mod contribution;
pub mod entity;
pub mod field;
pub mod instance;
pub mod registry;

pub use contribution::field_contribution;
pub use entity::{
    EntityBase, EntityDecl, EntityId, EntityMarker, EntityModel, EntityOptions, EntityParent,
};
pub use field::{FieldKind, FieldModel};
pub use instance::Instance;
pub use registry::{CqrsBase, EntityRegistry};
