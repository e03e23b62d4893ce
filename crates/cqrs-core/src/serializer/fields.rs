use crate::{
    RESERVED_FIELDS,
    error::ConfigurationError,
    model::{EntityId, EntityMarker, EntityRegistry, FieldKind, FieldModel, field_contribution},
    serializer::{SerializerDef, type_field},
    value::Value,
};
use indexmap::IndexMap;

///
/// FieldSource
/// Where an encoded field value comes from.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldSource {
    /// The instance primary key.
    Id,
    /// The instance's type path.
    TypePath,
    /// A named instance attribute.
    Attr(String),
}

///
/// ResolvedField
///
/// One entry of a serializer's resolved field set.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub kind: FieldKind,
    pub source: FieldSource,
    pub read_only: bool,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl ResolvedField {
    /// Field backed by a model field of the same name.
    #[must_use]
    pub fn from_model(field: &FieldModel) -> Self {
        Self {
            name: field.name.clone(),
            kind: field.kind.clone(),
            source: FieldSource::Attr(field.name.clone()),
            read_only: false,
            nullable: field.nullable,
            default: field.default.clone(),
        }
    }

    /// Writable fields without a fallback must be present on decode.
    #[must_use]
    pub const fn required(&self) -> bool {
        !self.read_only && !self.nullable && self.default.is_none()
    }
}

/// Fields terminating the merge for a root sentinel.
#[must_use]
pub fn root_fields(marker: EntityMarker) -> Vec<ResolvedField> {
    let mut fields = vec![type_field::id_field()];
    if marker == EntityMarker::Polymorphic {
        fields.push(type_field::type_field());
    }

    fields
}

/// Contribution of the model followed by the fields declared on the
/// serializer. A declared field replaces a contributed one of the same name.
pub fn local_fields(
    entities: &EntityRegistry,
    entity: EntityId,
    def: &SerializerDef,
) -> Result<IndexMap<String, ResolvedField>, ConfigurationError> {
    let mut local: IndexMap<String, ResolvedField> = field_contribution(entities, entity)
        .into_values()
        .map(|field| (field.name.clone(), ResolvedField::from_model(field)))
        .collect();

    let mut declared_names = Vec::with_capacity(def.declared.len());
    for declared in &def.declared {
        if RESERVED_FIELDS.contains(&declared.name.as_str()) {
            return Err(ConfigurationError::DeclaredReserved {
                serializer: def.name.clone(),
                field: declared.name.clone(),
            });
        }
        if declared_names.contains(&declared.name.as_str()) {
            return Err(ConfigurationError::DuplicateDeclaredField {
                serializer: def.name.clone(),
                field: declared.name.clone(),
            });
        }
        declared_names.push(declared.name.as_str());

        local.insert(
            declared.name.clone(),
            ResolvedField {
                name: declared.name.clone(),
                kind: declared.kind.clone(),
                source: FieldSource::Attr(declared.source_attr().to_string()),
                read_only: declared.read_only,
                nullable: false,
                default: None,
            },
        );
    }

    Ok(local)
}

/// Apply `fields` / `exclude` to the local contribution.
///
/// Both options may only name local fields. `id` and `type` are always
/// present through the root; naming them in `fields` is a no-op, excluding
/// them is an error.
pub fn filter_local(
    entities: &EntityRegistry,
    entity: EntityId,
    def: &SerializerDef,
    mut local: IndexMap<String, ResolvedField>,
) -> Result<IndexMap<String, ResolvedField>, ConfigurationError> {
    let not_local = |field: &str| ConfigurationError::FieldNotLocal {
        serializer: def.name.clone(),
        entity: entities.path(entity),
        field: field.to_string(),
    };

    match (&def.meta.fields, &def.meta.exclude) {
        (Some(_), Some(_)) => Err(ConfigurationError::FieldsAndExclude {
            serializer: def.name.clone(),
        }),

        (Some(allow), None) => {
            let mut kept = IndexMap::with_capacity(allow.len());
            for name in allow {
                if RESERVED_FIELDS.contains(&name.as_str()) || kept.contains_key(name) {
                    continue;
                }
                let field = local.shift_remove(name).ok_or_else(|| not_local(name))?;
                kept.insert(name.clone(), field);
            }

            Ok(kept)
        }

        (None, Some(deny)) => {
            for name in deny {
                if RESERVED_FIELDS.contains(&name.as_str()) {
                    return Err(ConfigurationError::ExcludeReserved {
                        serializer: def.name.clone(),
                        field: name.clone(),
                    });
                }
                local.shift_remove(name).ok_or_else(|| not_local(name))?;
            }

            Ok(local)
        }

        (None, None) => Ok(local),
    }
}

/// Ancestor fields first, then local fields; a local field shadowing an
/// ancestor field keeps the ancestor's slot.
#[must_use]
pub fn merge(base: &[ResolvedField], local: IndexMap<String, ResolvedField>) -> Vec<ResolvedField> {
    let mut merged: IndexMap<String, ResolvedField> = base
        .iter()
        .map(|field| (field.name.clone(), field.clone()))
        .collect();

    for (name, field) in local {
        merged.insert(name, field);
    }

    merged.into_values().collect()
}

/// Full resolution for a definition on top of its base's resolved fields.
pub fn resolve(
    entities: &EntityRegistry,
    entity: EntityId,
    def: &SerializerDef,
    base: &[ResolvedField],
) -> Result<Vec<ResolvedField>, ConfigurationError> {
    let local = local_fields(entities, entity, def)?;
    let local = filter_local(entities, entity, def, local)?;

    Ok(merge(base, local))
}
