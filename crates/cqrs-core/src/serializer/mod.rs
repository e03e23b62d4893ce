//! Read-side serializers: definitions, the registry with derivation and
//! polymorphic substitution, field resolution, and the record codec.

mod codec;
mod def;
mod derive;
mod fields;
mod registry;
mod substitute;
pub mod type_field;


pub use codec::{Decoded, FieldErrors};
pub use def::{DeclaredField, SerializerDef, SerializerId, SerializerMeta, derived_name};
pub use fields::{FieldSource, ResolvedField, filter_local, local_fields, merge, root_fields};
pub use registry::{Serializer, SerializerRegistry};
