use crate::{
    error::{ConfigurationError, Error, LookupError},
    model::{CqrsBase, EntityId, EntityMarker, EntityRegistry},
    serializer::{ResolvedField, SerializerDef, SerializerId, SerializerMeta, fields},
};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

///
/// Serializer
///
/// A constructed serializer. Immutable and shared; the resolved field set is
/// computed once at construction.
///

#[derive(Debug)]
pub struct Serializer {
    id: SerializerId,
    name: String,
    family: EntityMarker,
    model: Option<EntityId>,
    def: Option<SerializerDef>,
    derived: bool,
    fields: Vec<ResolvedField>,
}

impl Serializer {
    fn root(marker: EntityMarker) -> Self {
        let name = match marker {
            EntityMarker::Plain => "CqrsSerializer",
            EntityMarker::Polymorphic => "CqrsPolymorphicSerializer",
        };

        Self {
            id: SerializerId::root(marker),
            name: name.to_string(),
            family: marker,
            model: None,
            def: None,
            derived: false,
            fields: fields::root_fields(marker),
        }
    }

    #[must_use]
    pub const fn id(&self) -> SerializerId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn family(&self) -> EntityMarker {
        self.family
    }

    #[must_use]
    pub fn is_polymorphic(&self) -> bool {
        self.family == EntityMarker::Polymorphic
    }

    /// Target entity; `None` for the root sentinels.
    #[must_use]
    pub const fn model(&self) -> Option<EntityId> {
        self.model
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.model.is_none()
    }

    /// Base serializer; `None` for the root sentinels.
    #[must_use]
    pub fn base(&self) -> Option<SerializerId> {
        self.def.as_ref().map(|def| def.base)
    }

    #[must_use]
    pub fn meta(&self) -> Option<&SerializerMeta> {
        self.def.as_ref().map(|def| &def.meta)
    }

    /// Prepared definition the serializer was built from.
    #[must_use]
    pub const fn definition(&self) -> Option<&SerializerDef> {
        self.def.as_ref()
    }

    /// Whether the serializer was synthesized rather than authored.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.derived
    }

    #[must_use]
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

///
/// SerializerState
///
/// Arena of constructed serializers plus the entity index. Only ever
/// touched through the registry lock.
///

#[derive(Debug)]
pub(crate) struct SerializerState {
    pub(crate) serializers: Vec<Arc<Serializer>>,
    pub(crate) by_entity: HashMap<EntityId, SerializerId>,
}

impl SerializerState {
    fn new() -> Self {
        Self {
            serializers: vec![
                Arc::new(Serializer::root(EntityMarker::Plain)),
                Arc::new(Serializer::root(EntityMarker::Polymorphic)),
            ],
            by_entity: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, id: SerializerId) -> Result<&Arc<Serializer>, LookupError> {
        self.serializers
            .get(id.index())
            .ok_or(LookupError::UnknownSerializer(id.get()))
    }

    fn name_of(&self, id: SerializerId) -> String {
        self.get(id)
            .map_or_else(|_| id.to_string(), |s| s.name.clone())
    }

    /// Resolve a definition's target entity; it must be concrete.
    pub(crate) fn target(
        entities: &EntityRegistry,
        def: &SerializerDef,
    ) -> Result<EntityId, ConfigurationError> {
        let entity = entities.lookup(&def.meta.model).ok_or_else(|| {
            ConfigurationError::UnknownModel {
                serializer: def.name.clone(),
                entity: def.meta.model.clone(),
            }
        })?;

        if !entities.get(entity).is_concrete() {
            return Err(ConfigurationError::NotConcrete {
                serializer: def.name.clone(),
                entity: def.meta.model.clone(),
            });
        }

        Ok(entity)
    }

    /// Prepare, validate and construct a serializer, then index it by entity.
    pub(crate) fn register(
        &mut self,
        entities: &EntityRegistry,
        def: SerializerDef,
        derived: bool,
    ) -> Result<SerializerId, Error> {
        let entity = Self::target(entities, &def)?;
        let def = self.substitute(entities, entity, def)?;

        // identical definitions collapse onto the existing serializer
        if let Some(existing) = self.by_entity.get(&entity).copied() {
            let current = self.get(existing)?;
            if current.def.as_ref() == Some(&def) {
                log::warn!(
                    "serializer '{}' for '{}' registered again; keeping {existing}",
                    def.name,
                    def.meta.model,
                );
                return Ok(existing);
            }

            return Err(ConfigurationError::AlreadyRegistered {
                entity: def.meta.model.clone(),
                existing: current.name.clone(),
                serializer: def.name.clone(),
            }
            .into());
        }

        let expected = self.expected_base(entities, entity)?;
        if def.base != expected {
            return Err(ConfigurationError::InvalidBase {
                serializer: def.name.clone(),
                entity: def.meta.model.clone(),
                base: self.name_of(def.base),
                expected: self.name_of(expected),
            }
            .into());
        }

        let (family, resolved) = {
            let base = self.get(def.base)?;
            (base.family, fields::resolve(entities, entity, &def, &base.fields)?)
        };

        let id = SerializerId(u32::try_from(self.serializers.len()).unwrap_or(u32::MAX));
        log::debug!(
            "registered {} serializer '{}' ({id}) for '{}' on '{}': [{}]",
            if derived { "derived" } else { "authored" },
            def.name,
            def.meta.model,
            self.name_of(def.base),
            resolved
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );

        self.serializers.push(Arc::new(Serializer {
            id,
            name: def.name.clone(),
            family,
            model: Some(entity),
            def: Some(def),
            derived,
            fields: resolved,
        }));
        self.by_entity.insert(entity, id);

        Ok(id)
    }

    // expected_base
    // serializer of the nearest concrete ancestor, else the family root
    fn expected_base(
        &mut self,
        entities: &EntityRegistry,
        entity: EntityId,
    ) -> Result<SerializerId, Error> {
        match entities.cqrs_base(entity) {
            Some(CqrsBase::Model(parent)) => self.derive_or_get(entities, parent),
            Some(CqrsBase::Marker(marker)) => Ok(SerializerId::root(marker)),
            None => Err(ConfigurationError::NotCqrs {
                entity: entities.path(entity),
            }
            .into()),
        }
    }
}

///
/// SerializerRegistry
///
/// Explicit registry of serializers keyed by entity, bound to a frozen
/// entity registry. Reads take the read lock; registration and derivation
/// take the write lock and re-check under it.
///

#[derive(Debug)]
pub struct SerializerRegistry {
    entities: Arc<EntityRegistry>,
    state: RwLock<SerializerState>,
}

impl SerializerRegistry {
    /// Create a registry holding only the two root sentinels.
    #[must_use]
    pub fn new(entities: Arc<EntityRegistry>) -> Self {
        Self {
            entities,
            state: RwLock::new(SerializerState::new()),
        }
    }

    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    #[must_use]
    pub fn entities_arc(&self) -> Arc<EntityRegistry> {
        Arc::clone(&self.entities)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, SerializerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SerializerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an authored serializer for its model.
    ///
    /// Fails when the model is abstract or proxy, the base does not match the
    /// model's nearest concrete ancestor, the field options are invalid, or a
    /// different serializer is already registered for the model.
    pub fn register(&self, def: SerializerDef) -> Result<SerializerId, Error> {
        self.write().register(&self.entities, def, false)
    }

    /// Serializer registered for an entity, if any. Never derives.
    #[must_use]
    pub fn lookup(&self, entity: EntityId) -> Option<SerializerId> {
        self.read().by_entity.get(&entity).copied()
    }

    /// Root sentinel for a marker family.
    #[must_use]
    pub const fn root_serializer_for(marker: EntityMarker) -> SerializerId {
        SerializerId::root(marker)
    }

    pub fn get(&self, id: SerializerId) -> Result<Arc<Serializer>, LookupError> {
        self.read().get(id).map(Arc::clone)
    }

    /// Serializer for an entity, deriving it on first use.
    pub fn for_entity(&self, entity: EntityId) -> Result<Arc<Serializer>, Error> {
        let id = self.derive_or_get(entity)?;

        Ok(self.get(id)?)
    }

    /// Serializer for an entity path, deriving it on first use.
    pub fn for_path(&self, path: &str) -> Result<Arc<Serializer>, Error> {
        let entity = self.entities.resolve_path(path)?;

        self.for_entity(entity)
    }

    /// Number of constructed serializers, sentinels included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().serializers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every constructed serializer, in construction order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Serializer>> {
        self.read().serializers.clone()
    }

    /// Derive a serializer for every concrete CQRS entity so that later reads
    /// never need the write lock. Returns the number of entities covered.
    pub fn warm_up(&self) -> Result<usize, Error> {
        let mut state = self.write();
        let mut count = 0;

        for entity in self.entities.concrete() {
            if self.entities.family(entity.id).is_some() {
                state.derive_or_get(&self.entities, entity.id)?;
                count += 1;
            }
        }
        log::debug!("warmed up {count} serializers");

        Ok(count)
    }
}
