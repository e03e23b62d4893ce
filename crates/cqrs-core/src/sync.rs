use crate::{
    backend::Backend,
    collection::{CollectionId, CollectionKind, CollectionRegistry},
    error::Error,
    model::EntityId,
    serializer::Decoded,
    traits::EntityInstance,
    value::Value,
};
use std::{collections::HashMap, sync::Arc};

///
/// Denormalizer
///
/// Keeps a backend in step with write-side changes. Every root collection
/// listens on its model; polymorphic collections also listen on each
/// concrete descendant.
///

#[derive(Debug)]
pub struct Denormalizer<B: Backend> {
    collections: Arc<CollectionRegistry>,
    backend: B,
    listeners: HashMap<EntityId, Vec<CollectionId>>,
}

impl<B: Backend> Denormalizer<B> {
    /// Bind the root collections registered so far to a backend.
    pub fn new(collections: Arc<CollectionRegistry>, backend: B) -> Result<Self, Error> {
        let mut listeners: HashMap<EntityId, Vec<CollectionId>> = HashMap::new();

        for collection in collections.roots() {
            for entity in collections.related_models(collection.id)? {
                listeners.entry(entity).or_default().push(collection.id);
            }
        }
        log::debug!("denormalizer listening on {} entities", listeners.len());

        Ok(Self {
            collections,
            backend,
            listeners,
        })
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Collections listening on an entity.
    #[must_use]
    pub fn listeners(&self, entity: EntityId) -> &[CollectionId] {
        self.listeners.get(&entity).map_or(&[], Vec::as_slice)
    }

    /// Push a saved instance to every listening collection.
    /// Returns the number of documents written.
    pub fn saved(&mut self, instance: &dyn EntityInstance, created: bool) -> Result<usize, Error> {
        let entity = self
            .collections
            .entities()
            .resolve_path(instance.entity_path())?;
        let doc_id = instance.id();
        let targets = self.listeners(entity).to_vec();

        for id in &targets {
            let collection = self.collections.get(*id)?;
            let name = self.collections.name_of(&collection)?;
            let doc = self.collections.dump(*id, instance)?;

            if created {
                self.backend.added(&name, &doc_id, doc)?;
            } else {
                self.backend.changed(&name, &doc_id, doc)?;
            }
        }

        Ok(targets.len())
    }

    /// Remove a deleted instance from every listening collection, once each.
    pub fn deleted(&mut self, instance: &dyn EntityInstance) -> Result<usize, Error> {
        let entity = self
            .collections
            .entities()
            .resolve_path(instance.entity_path())?;
        let doc_id = instance.id();
        let targets = self.listeners(entity).to_vec();

        for id in &targets {
            let collection = self.collections.get(*id)?;
            let name = self.collections.name_of(&collection)?;
            self.backend.deleted(&name, &doc_id)?;
        }

        Ok(targets.len())
    }

    /// Read a document back from a collection and decode it.
    ///
    /// Polymorphic collections decode through the `type` field.
    pub fn load(&self, label: &str, doc_id: &Value) -> Result<Option<Decoded>, Error> {
        let collection = self.collections.by_label(label)?;
        let name = self.collections.name_of(&collection)?;

        let Some(doc) = self.backend.get_doc(&name, doc_id)? else {
            return Ok(None);
        };

        let serializers = self.collections.serializers();
        let model = match collection.kind {
            CollectionKind::Sub => self.collections.root_collection_for(collection.model)?.model,
            CollectionKind::Plain | CollectionKind::Polymorphic => collection.model,
        };
        let serializer = serializers.for_entity(model)?;

        serializers.decode(serializer.id(), &doc).map(Some)
    }
}
