use crate::{
    error::Error,
    model::{CqrsBase, EntityId, EntityRegistry},
    serializer::{
        SerializerDef, SerializerId,
        registry::{SerializerRegistry, SerializerState},
    },
};

impl SerializerState {
    // substitute
    // a definition written against the polymorphic root for an entity with a
    // concrete ancestor is rebased onto that ancestor's serializer
    pub(crate) fn substitute(
        &mut self,
        entities: &EntityRegistry,
        entity: EntityId,
        mut def: SerializerDef,
    ) -> Result<SerializerDef, Error> {
        if def.base != SerializerId::POLYMORPHIC_ROOT || !entities.is_polymorphic(entity) {
            return Ok(def);
        }

        if let Some(CqrsBase::Model(parent)) = entities.cqrs_base(entity) {
            let base = self.derive_or_get(entities, parent)?;
            log::debug!(
                "serializer '{}' rebased from the polymorphic root onto {base}",
                def.name
            );
            def.base = base;
        }

        Ok(def)
    }
}

impl SerializerRegistry {
    /// First phase of the two-phase build: resolve the definition's base.
    ///
    /// Applying it to an already prepared definition is a no-op.
    pub fn prepare(&self, def: SerializerDef) -> Result<SerializerDef, Error> {
        let entity = SerializerState::target(self.entities(), &def)?;

        self.write().substitute(self.entities(), entity, def)
    }
}
