//! Document collections: named read-side projections bound to a model and
//! dumped through the model's serializer.


use crate::{
    error::{CodecError, ConfigurationError, Error, LookupError},
    model::{EntityId, EntityRegistry},
    serializer::SerializerRegistry,
    traits::EntityInstance,
    value::Record,
};
use derive_more::Display;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

///
/// CollectionKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum CollectionKind {
    /// Non-polymorphic collection over a plain model.
    Plain,
    /// Root collection of a polymorphic hierarchy.
    Polymorphic,
    /// Per-subtype part of a polymorphic collection.
    Sub,
}

///
/// CollectionId
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("collection#{_0}")]
pub struct CollectionId(u32);

impl CollectionId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

///
/// CollectionDef
///
/// Declaration of a collection. `label` names the collection type,
/// `name` optionally overrides the document collection name.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectionDef {
    pub label: String,
    pub model: String,
    pub kind: CollectionKind,
    pub name: Option<String>,
}

impl CollectionDef {
    #[must_use]
    pub fn new(label: impl Into<String>, kind: CollectionKind, model: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            model: model.into(),
            kind,
            name: None,
        }
    }

    #[must_use]
    pub fn plain(label: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(label, CollectionKind::Plain, model)
    }

    #[must_use]
    pub fn polymorphic(label: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(label, CollectionKind::Polymorphic, model)
    }

    #[must_use]
    pub fn sub(label: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(label, CollectionKind::Sub, model)
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

///
/// Collection
///

#[derive(Clone, Debug)]
pub struct Collection {
    pub id: CollectionId,
    pub label: String,
    pub model: EntityId,
    pub kind: CollectionKind,
    pub name: Option<String>,
    pub derived: bool,
}

///
/// CollectionState
///

#[derive(Debug, Default)]
struct CollectionState {
    collections: Vec<Arc<Collection>>,
    labels: HashMap<String, CollectionId>,
    subcollections: HashMap<EntityId, CollectionId>,
}

impl CollectionState {
    fn get(&self, id: CollectionId) -> Result<&Arc<Collection>, LookupError> {
        self.collections
            .get(id.index())
            .ok_or_else(|| LookupError::UnknownCollection(id.to_string()))
    }

    fn insert(
        &mut self,
        label: String,
        model: EntityId,
        kind: CollectionKind,
        name: Option<String>,
        derived: bool,
    ) -> Result<CollectionId, ConfigurationError> {
        if self.labels.contains_key(&label) {
            return Err(ConfigurationError::DuplicateCollection { collection: label });
        }

        let id = CollectionId(u32::try_from(self.collections.len()).unwrap_or(u32::MAX));
        self.labels.insert(label.clone(), id);
        if kind == CollectionKind::Sub {
            self.subcollections.insert(model, id);
        }
        self.collections.push(Arc::new(Collection {
            id,
            label,
            model,
            kind,
            name,
            derived,
        }));

        Ok(id)
    }
}

///
/// CollectionRegistry
///
/// Collections by label, plus one subcollection per concrete polymorphic
/// entity (explicit or derived on first use).
///

#[derive(Debug)]
pub struct CollectionRegistry {
    serializers: Arc<SerializerRegistry>,
    state: RwLock<CollectionState>,
}

impl CollectionRegistry {
    #[must_use]
    pub fn new(serializers: Arc<SerializerRegistry>) -> Self {
        Self {
            serializers,
            state: RwLock::new(CollectionState::default()),
        }
    }

    #[must_use]
    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        self.serializers.entities()
    }

    fn read(&self) -> RwLockReadGuard<'_, CollectionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CollectionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a collection, checking its model against the collection
    /// kind's required family.
    pub fn register(&self, def: CollectionDef) -> Result<CollectionId, Error> {
        let entities = self.entities();
        let model = entities.lookup(&def.model).ok_or_else(|| {
            ConfigurationError::UnknownCollectionModel {
                collection: def.label.clone(),
                entity: def.model.clone(),
            }
        })?;

        let polymorphic = entities.is_polymorphic(model);
        match def.kind {
            CollectionKind::Plain if polymorphic => {
                return Err(ConfigurationError::PolymorphicModelInPlainCollection {
                    collection: def.label,
                    entity: entities.get(model).name.clone(),
                }
                .into());
            }
            CollectionKind::Polymorphic | CollectionKind::Sub if !polymorphic => {
                return Err(ConfigurationError::PlainModelInPolymorphicCollection {
                    collection: def.label,
                    entity: entities.get(model).name.clone(),
                }
                .into());
            }
            _ => {}
        }

        let mut state = self.write();
        if def.kind == CollectionKind::Sub
            && let Some(existing) = state.subcollections.get(&model).copied()
        {
            return Err(ConfigurationError::DuplicateSubCollection {
                entity: def.model,
                existing: state.get(existing)?.label.clone(),
            }
            .into());
        }

        let id = state.insert(def.label, model, def.kind, def.name, false)?;
        log::debug!("registered {} collection {id} for '{}'", def.kind, def.model);

        Ok(id)
    }

    pub fn get(&self, id: CollectionId) -> Result<Arc<Collection>, LookupError> {
        self.read().get(id).map(Arc::clone)
    }

    pub fn by_label(&self, label: &str) -> Result<Arc<Collection>, LookupError> {
        let state = self.read();
        let id = state
            .labels
            .get(label)
            .copied()
            .ok_or_else(|| LookupError::UnknownCollection(label.to_string()))?;

        state.get(id).map(Arc::clone)
    }

    /// Every registered collection, subcollections included.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Collection>> {
        self.read().collections.clone()
    }

    /// Root (non-sub) collections.
    #[must_use]
    pub fn roots(&self) -> Vec<Arc<Collection>> {
        self.all()
            .into_iter()
            .filter(|c| c.kind != CollectionKind::Sub)
            .collect()
    }

    /// Subcollection for a concrete polymorphic entity, derived on first use.
    pub fn subcollection_for(&self, entity: EntityId) -> Result<Arc<Collection>, Error> {
        {
            let state = self.read();
            if let Some(id) = state.subcollections.get(&entity) {
                return Ok(Arc::clone(state.get(*id)?));
            }
        }

        let entities = self.entities();
        let model = entities.get(entity);
        if !entities.is_polymorphic(entity) {
            return Err(ConfigurationError::PlainModelInPolymorphicCollection {
                collection: format!("{}AutoSubCollection", model.name),
                entity: model.name.clone(),
            }
            .into());
        }

        let mut state = self.write();
        if let Some(id) = state.subcollections.get(&entity).copied() {
            return Ok(Arc::clone(state.get(id)?));
        }

        let label = format!("{}AutoSubCollection", model.name);
        log::debug!("deriving subcollection '{label}'");
        let id = state.insert(label, entity, CollectionKind::Sub, None, true)?;

        Ok(Arc::clone(state.get(id)?))
    }

    /// Document collection name.
    ///
    /// Root collections default to `<app_label>_<model name>`; subcollections
    /// take the name of the nearest polymorphic collection above them.
    pub fn name_of(&self, collection: &Collection) -> Result<String, Error> {
        if let Some(name) = &collection.name {
            return Ok(name.clone());
        }

        match collection.kind {
            CollectionKind::Plain | CollectionKind::Polymorphic => {
                let model = self.entities().get(collection.model);
                Ok(format!("{}_{}", model.app_label, model.name.to_lowercase()))
            }
            CollectionKind::Sub => {
                let root = self.root_collection_for(collection.model)?;
                self.name_of(&root)
            }
        }
    }

    /// Nearest polymorphic root collection over an entity or its ancestors.
    pub fn root_collection_for(&self, entity: EntityId) -> Result<Arc<Collection>, Error> {
        let entities = self.entities();
        let roots: Vec<_> = self
            .roots()
            .into_iter()
            .filter(|c| c.kind == CollectionKind::Polymorphic)
            .collect();

        std::iter::once(entity)
            .chain(entities.ancestors(entity))
            .find_map(|candidate| roots.iter().find(|c| c.model == candidate).cloned())
            .ok_or_else(|| LookupError::NoRootCollection(entities.path(entity)).into())
    }

    /// Entities whose changes affect a collection: its model, plus every
    /// concrete descendant for polymorphic collections.
    pub fn related_models(&self, id: CollectionId) -> Result<Vec<EntityId>, Error> {
        let collection = self.get(id)?;
        let entities = self.entities();
        let mut related = vec![collection.model];

        if collection.kind != CollectionKind::Plain {
            related.extend(
                entities
                    .descendants(collection.model)
                    .into_iter()
                    .filter(|e| entities.get(*e).is_concrete()),
            );
        }

        Ok(related)
    }

    /// Encode an instance for a collection.
    ///
    /// Polymorphic collections hand refined instances to the subcollection
    /// of the instance's entity.
    pub fn dump(&self, id: CollectionId, instance: &dyn EntityInstance) -> Result<Record, Error> {
        let collection = self.get(id)?;
        let entities = self.entities();
        let entity = entities.resolve_path(instance.entity_path())?;

        if !entities.is_subclass(entity, collection.model) {
            return Err(CodecError::NotInstance {
                serializer: collection.label.clone(),
                entity: instance.entity_path().to_string(),
            }
            .into());
        }

        let target = if collection.kind == CollectionKind::Polymorphic && entity != collection.model
        {
            self.subcollection_for(entity)?.model
        } else {
            collection.model
        };
        let serializer = self.serializers.for_entity(target)?;

        self.serializers.encode(serializer.id(), instance)
    }
}
