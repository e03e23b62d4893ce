use crate::{
    error::{ConfigurationError, Error},
    model::{CqrsBase, EntityId, EntityRegistry},
    serializer::{
        SerializerDef, SerializerId, derived_name,
        registry::{SerializerRegistry, SerializerState},
    },
};

impl SerializerState {
    /// Return the serializer registered for `entity`, synthesizing one (and
    /// any missing ancestor serializers, nearest concrete ancestor first)
    /// when none exists.
    pub(crate) fn derive_or_get(
        &mut self,
        entities: &EntityRegistry,
        entity: EntityId,
    ) -> Result<SerializerId, Error> {
        if let Some(id) = self.by_entity.get(&entity).copied() {
            return Ok(id);
        }

        let model = entities.get(entity);
        if !model.is_concrete() {
            return Err(ConfigurationError::NotConcrete {
                serializer: derived_name(&model.name),
                entity: model.path(),
            }
            .into());
        }

        let base = match entities.cqrs_base(entity) {
            Some(CqrsBase::Model(parent)) => self.derive_or_get(entities, parent)?,
            Some(CqrsBase::Marker(marker)) => SerializerId::root(marker),
            None => {
                return Err(ConfigurationError::NotCqrs {
                    entity: model.path(),
                }
                .into());
            }
        };

        log::debug!("deriving serializer for '{}'", model.path());
        let def = SerializerDef::derived(&model.name, base, model.path());

        self.register(entities, def, true)
    }
}

impl SerializerRegistry {
    /// Serializer for `entity`, derived on first use and cached for the
    /// registry's lifetime. Repeated calls return the same id.
    pub fn derive_or_get(&self, entity: EntityId) -> Result<SerializerId, Error> {
        if let Some(id) = self.lookup(entity) {
            return Ok(id);
        }

        // re-checked under the write lock
        self.write().derive_or_get(self.entities(), entity)
    }
}

///
/// TESTS
///
