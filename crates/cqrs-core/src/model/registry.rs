use crate::{
    RESERVED_FIELDS,
    error::{ConfigurationError, LookupError},
    model::{
        entity::{EntityBase, EntityDecl, EntityId, EntityMarker, EntityModel, EntityParent},
        field::FieldModel,
    },
};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

///
/// CqrsBase
///
/// What an entity's serializer must derive from: the serializer of the
/// nearest concrete CQRS ancestor, or the root of the entity's family.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CqrsBase {
    Marker(EntityMarker),
    Model(EntityId),
}

///
/// EntityRegistry
///
/// Arena of declared entities indexed by `EntityId`, with a path index for
/// the `path -> entity` inverse lookup. Entities are immutable once declared;
/// bases must be declared before their children.
///

#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Vec<EntityModel>,
    paths: HashMap<String, EntityId>,
    families: Vec<Option<EntityMarker>>,
    nearest_concrete: Vec<Option<EntityId>>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entity, validating its bases and fields.
    pub fn declare(&mut self, decl: EntityDecl) -> Result<EntityId, ConfigurationError> {
        let path = decl.path();
        if self.paths.contains_key(&path) {
            return Err(ConfigurationError::DuplicateEntity { entity: path });
        }

        // bases
        let mut parents = Vec::with_capacity(decl.bases.len());
        for base in &decl.bases {
            let parent = match base {
                EntityBase::Marker(marker) => EntityParent::Marker(*marker),
                EntityBase::Model(base_path) => {
                    let id = self.lookup(base_path).ok_or_else(|| {
                        ConfigurationError::UnknownBase {
                            entity: path.clone(),
                            base: base_path.clone(),
                        }
                    })?;
                    EntityParent::Model(id)
                }
            };
            parents.push(parent);
        }

        let family = self.resolve_family(&path, &parents)?;
        self.check_fields(&path, &parents, &decl.fields)?;

        let concrete = !decl.options.is_abstract && !decl.options.is_proxy;
        if family.is_none() && !decl.options.is_abstract {
            return Err(ConfigurationError::NotCqrs { entity: path });
        }
        if decl.options.is_proxy && !decl.fields.is_empty() {
            return Err(ConfigurationError::ProxyWithFields { entity: path });
        }

        let nearest = self.resolve_nearest_concrete(&path, &parents)?;

        let id = EntityId(u32::try_from(self.entities.len()).unwrap_or(u32::MAX));
        log::debug!(
            "declared entity {path} ({}, family {})",
            if concrete { "concrete" } else { "non-concrete" },
            family.map_or_else(|| "none".to_string(), |f| f.to_string()),
        );

        self.entities.push(EntityModel {
            id,
            app_label: decl.app_label,
            module: decl.module,
            name: decl.name,
            options: decl.options,
            parents,
            fields: decl.fields,
        });
        self.families.push(family);
        self.nearest_concrete.push(nearest);
        self.paths.insert(path, id);

        Ok(id)
    }

    /// Borrow a declared entity.
    ///
    /// Ids are only minted by this registry; an id from another registry
    /// panics.
    #[must_use]
    pub fn get(&self, id: EntityId) -> &EntityModel {
        &self.entities[id.index()]
    }

    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<EntityId> {
        self.paths.get(path).copied()
    }

    /// Inverse of `EntityModel::path`.
    pub fn resolve_path(&self, path: &str) -> Result<EntityId, LookupError> {
        self.lookup(path)
            .ok_or_else(|| LookupError::UnknownEntityPath(path.to_string()))
    }

    #[must_use]
    pub fn path(&self, id: EntityId) -> String {
        self.get(id).path()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.iter()
    }

    pub fn concrete(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.iter().filter(|e| e.is_concrete())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// CQRS family of an entity; `None` for non-CQRS mixins.
    #[must_use]
    pub fn family(&self, id: EntityId) -> Option<EntityMarker> {
        self.families[id.index()]
    }

    #[must_use]
    pub fn is_polymorphic(&self, id: EntityId) -> bool {
        self.family(id) == Some(EntityMarker::Polymorphic)
    }

    /// All model ancestors, nearest first, each listed once.
    #[must_use]
    pub fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<EntityId> = self.get(id).parent_models().collect();

        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                order.push(next);
                queue.extend(self.get(next).parent_models());
            }
        }

        order
    }

    /// Concrete CQRS ancestors, nearest first.
    #[must_use]
    pub fn concrete_ancestors(&self, id: EntityId) -> Vec<EntityId> {
        self.ancestors(id)
            .into_iter()
            .filter(|a| self.get(*a).is_concrete() && self.family(*a).is_some())
            .collect()
    }

    /// Whether `child` is `parent` or inherits from it.
    #[must_use]
    pub fn is_subclass(&self, child: EntityId, parent: EntityId) -> bool {
        child == parent || self.ancestors(child).contains(&parent)
    }

    /// Every entity inheriting from `id`, in declaration order.
    #[must_use]
    pub fn descendants(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .iter()
            .map(|e| e.id)
            .filter(|e| *e != id && self.is_subclass(*e, id))
            .collect()
    }

    /// Nearest concrete CQRS ancestor, or the family marker when none exists.
    ///
    /// Returns `None` only for non-CQRS mixins.
    #[must_use]
    pub fn cqrs_base(&self, id: EntityId) -> Option<CqrsBase> {
        match self.nearest_concrete[id.index()] {
            Some(parent) => Some(CqrsBase::Model(parent)),
            None => self.family(id).map(CqrsBase::Marker),
        }
    }

    /// Full declared field mapping: inherited fields first, then own fields.
    /// The implicit `id` field is not included.
    #[must_use]
    pub fn all_fields(&self, id: EntityId) -> IndexMap<&str, &FieldModel> {
        let entity = self.get(id);
        let mut fields = IndexMap::new();

        for parent in entity.parent_models() {
            for (name, field) in self.all_fields(parent) {
                fields.entry(name).or_insert(field);
            }
        }
        for field in &entity.fields {
            fields.entry(field.name.as_str()).or_insert(field);
        }

        fields
    }

    // resolve_family
    // markers declared directly plus the families of every model base
    fn resolve_family(
        &self,
        path: &str,
        parents: &[EntityParent],
    ) -> Result<Option<EntityMarker>, ConfigurationError> {
        let mut family = None;

        for parent in parents {
            let candidate = match parent {
                EntityParent::Marker(marker) => Some(*marker),
                EntityParent::Model(id) => self.family(*id),
            };

            match (family, candidate) {
                (_, None) => {}
                (None, Some(c)) => family = Some(c),
                (Some(f), Some(c)) if f == c => {}
                (Some(_), Some(_)) => {
                    return Err(ConfigurationError::MixedFamily {
                        entity: path.to_string(),
                    });
                }
            }
        }

        Ok(family)
    }

    // check_fields
    // reserved names, duplicates, and clashes with inherited fields
    fn check_fields(
        &self,
        path: &str,
        parents: &[EntityParent],
        fields: &[FieldModel],
    ) -> Result<(), ConfigurationError> {
        let mut inherited = HashSet::new();
        for parent in parents {
            if let EntityParent::Model(id) = parent {
                inherited.extend(self.all_fields(*id).into_keys());
            }
        }

        let mut own = HashSet::new();
        for field in fields {
            let name = field.name.as_str();
            if RESERVED_FIELDS.contains(&name) {
                return Err(ConfigurationError::ReservedField {
                    entity: path.to_string(),
                    field: field.name.clone(),
                });
            }
            if !own.insert(name) || inherited.contains(name) {
                return Err(ConfigurationError::DuplicateField {
                    entity: path.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(())
    }

    // resolve_nearest_concrete
    // there can be only one concrete CQRS base across every base path
    fn resolve_nearest_concrete(
        &self,
        path: &str,
        parents: &[EntityParent],
    ) -> Result<Option<EntityId>, ConfigurationError> {
        let mut found: Vec<EntityId> = Vec::new();

        for parent in parents {
            let EntityParent::Model(id) = parent else {
                continue;
            };
            let model = self.get(*id);
            let candidate = if model.is_concrete() && self.family(*id).is_some() {
                Some(*id)
            } else {
                self.nearest_concrete[id.index()]
            };

            if let Some(candidate) = candidate
                && !found.contains(&candidate)
            {
                found.push(candidate);
            }
        }

        match found.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(*one)),
            many => Err(ConfigurationError::MultipleConcreteBases {
                entity: path.to_string(),
                bases: many.iter().map(|id| self.path(*id)).collect(),
            }),
        }
    }
}

///
/// TESTS
///
