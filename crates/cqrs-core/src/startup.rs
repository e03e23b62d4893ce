//! Application discovery and runtime wiring.
//!
//! Every app's models are declared before any serializer is registered, and
//! every serializer is registered before collections are bound, so
//! substitution always sees the full hierarchy.

use crate::{
    backend::{Backend, MemoryBackend},
    ID_FIELD,
    collection::{CollectionDef, CollectionKind, CollectionRegistry},
    config::CqrsConfig,
    error::{ConfigurationError, Error},
    model::{EntityDecl, EntityRegistry},
    serializer::{SerializerDef, SerializerRegistry},
    sync::Denormalizer,
};
use std::sync::Arc;

///
/// App
///
/// One installed application: its models, authored serializers and
/// collections.
///

pub trait App {
    fn label(&self) -> &str;

    fn models(&self) -> Vec<EntityDecl>;

    fn serializers(&self) -> Vec<SerializerDef> {
        Vec::new()
    }

    fn collections(&self) -> Vec<CollectionDef> {
        Vec::new()
    }
}

///
/// Runtime
///

#[derive(Debug)]
pub struct Runtime {
    config: CqrsConfig,
    collections: Arc<CollectionRegistry>,
}

impl Runtime {
    #[must_use]
    pub const fn config(&self) -> &CqrsConfig {
        &self.config
    }

    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        self.collections.entities()
    }

    #[must_use]
    pub fn serializers(&self) -> &SerializerRegistry {
        self.collections.serializers()
    }

    #[must_use]
    pub fn collections(&self) -> &Arc<CollectionRegistry> {
        &self.collections
    }

    /// Bind the runtime's collections to a backend.
    pub fn denormalizer<B: Backend>(&self, backend: B) -> Result<Denormalizer<B>, Error> {
        Denormalizer::new(Arc::clone(&self.collections), backend)
    }

    /// In-memory backend configured from the runtime config.
    #[must_use]
    pub fn memory_backend(&self) -> MemoryBackend {
        MemoryBackend::new(&self.config)
    }
}

/// Load every app and build the runtime.
///
/// Models must carry their app's label. Fields may not use the configured
/// document key, and collections may not use the model data collection
/// name.
pub fn start(config: CqrsConfig, apps: &[&dyn App]) -> Result<Runtime, Error> {
    let mut entities = EntityRegistry::new();
    for app in apps {
        let models = app.models();
        log::debug!("loading app '{}': {} models", app.label(), models.len());

        for decl in models {
            if decl.app_label != app.label() {
                return Err(ConfigurationError::ForeignModel {
                    app: app.label().to_string(),
                    entity: decl.path(),
                }
                .into());
            }
            if config.document_id_key != ID_FIELD
                && decl.fields.iter().any(|f| f.name == config.document_id_key)
            {
                return Err(ConfigurationError::ReservedField {
                    entity: decl.path(),
                    field: config.document_id_key.clone(),
                }
                .into());
            }
            entities.declare(decl)?;
        }
    }

    let serializers = SerializerRegistry::new(Arc::new(entities));
    for app in apps {
        for def in app.serializers() {
            serializers.register(def)?;
        }
    }

    let collections = CollectionRegistry::new(Arc::new(serializers));
    for app in apps {
        for def in app.collections() {
            let collection = collections.get(collections.register(def)?)?;
            if collection.kind == CollectionKind::Sub {
                continue;
            }

            let name = collections.name_of(&collection)?;
            if name == config.model_data_collection_name {
                return Err(ConfigurationError::ReservedCollectionName {
                    collection: collection.label.clone(),
                    name,
                }
                .into());
            }
        }
    }

    if config.warm_up {
        collections.serializers().warm_up()?;
    }

    log::info!(
        "cqrs started: apps [{}], {} entities, {} serializers, {} collections",
        apps.iter().map(|a| a.label()).collect::<Vec<_>>().join(", "),
        collections.entities().len(),
        collections.serializers().len(),
        collections.all().len(),
    );

    Ok(Runtime {
        config,
        collections: Arc::new(collections),
    })
}
