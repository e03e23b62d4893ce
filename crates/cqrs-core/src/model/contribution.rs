use crate::model::{EntityId, EntityRegistry, FieldModel};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Fields an entity introduces over its concrete CQRS ancestors.
///
/// The full declared mapping (inherited mixin fields included) minus every
/// field already carried by a concrete ancestor. Without a concrete ancestor
/// the whole mapping is returned. Order follows `EntityRegistry::all_fields`.
#[must_use]
pub fn field_contribution(
    entities: &EntityRegistry,
    entity: EntityId,
) -> IndexMap<&str, &FieldModel> {
    let inherited: HashSet<&str> = entities
        .concrete_ancestors(entity)
        .into_iter()
        .flat_map(|ancestor| entities.all_fields(ancestor).into_keys())
        .collect();

    entities
        .all_fields(entity)
        .into_iter()
        .filter(|(name, _)| !inherited.contains(name))
        .collect()
}

///
/// TESTS
///
