use crate::value::Value;

// ============================================================================
// ENTITY INSTANCES
// ============================================================================
//
// The write-side persistence layer owns instances; the read side only needs
// to know which entity an instance is and how to read its attributes.
//

///
/// EntityInstance
///
/// A live instance of a declared entity, typed as its most-refined entity.
///
/// ## Semantics
/// - `entity_path` names the instance's runtime entity, not a base
/// - `attr` reads fields, properties and computed values alike
/// - `type_path` feeds the polymorphic `type` field and must stay
///   resolvable through `EntityRegistry::resolve_path`
///

pub trait EntityInstance {
    /// Fully-qualified path of the instance's runtime entity.
    fn entity_path(&self) -> &str;

    /// Primary key value.
    fn id(&self) -> Value;

    /// Read an attribute by name; `None` when the instance has no such
    /// attribute.
    fn attr(&self, name: &str) -> Option<Value>;

    /// Discriminator written to the `type` field.
    fn type_path(&self) -> String {
        self.entity_path().to_string()
    }
}

impl<T: EntityInstance + ?Sized> EntityInstance for &T {
    fn entity_path(&self) -> &str {
        (**self).entity_path()
    }

    fn id(&self) -> Value {
        (**self).id()
    }

    fn attr(&self, name: &str) -> Option<Value> {
        (**self).attr(name)
    }

    fn type_path(&self) -> String {
        (**self).type_path()
    }
}
