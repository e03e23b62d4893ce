//! The reserved `id` and `type` fields.
//!
//! `type` is read-only and carries the instance's own type path, not the
//! path of the serializer's model. Decoding reads it back to pick the
//! concrete target entity.

use crate::{
    ID_FIELD, TYPE_FIELD,
    error::{CodecError, Error, LookupError},
    model::{EntityId, EntityRegistry, FieldKind},
    serializer::{FieldErrors, FieldSource, ResolvedField},
    value::{Record, Value},
};

/// Primary key field present on every serializer.
#[must_use]
pub fn id_field() -> ResolvedField {
    ResolvedField {
        name: ID_FIELD.to_string(),
        kind: FieldKind::Any,
        source: FieldSource::Id,
        read_only: true,
        nullable: false,
        default: None,
    }
}

/// Discriminator field present on every polymorphic serializer.
#[must_use]
pub fn type_field() -> ResolvedField {
    ResolvedField {
        name: TYPE_FIELD.to_string(),
        kind: FieldKind::Text,
        source: FieldSource::TypePath,
        read_only: true,
        nullable: false,
        default: None,
    }
}

/// Resolve the entity named by a record's `type` field.
///
/// The entity must be concrete and polymorphic. With `within` set, it must
/// also be that entity or one of its descendants.
pub fn resolve_type(
    entities: &EntityRegistry,
    record: &Record,
    within: Option<EntityId>,
) -> Result<EntityId, Error> {
    let invalid = |message: String| {
        let mut errors = FieldErrors::new();
        errors.add(TYPE_FIELD, message);
        Error::from(CodecError::Invalid(errors))
    };

    let path = match record.get(TYPE_FIELD) {
        None | Some(Value::Null) => {
            return Err(invalid("No polymorphic type provided.".to_string()));
        }
        Some(Value::Text(path)) => path,
        Some(other) => return Err(invalid(format!("Invalid type {other}."))),
    };

    let entity = entities
        .lookup(path)
        .ok_or_else(|| LookupError::UnknownTypePath(path.clone()))?;

    let valid = entities.is_polymorphic(entity)
        && entities.get(entity).is_concrete()
        && within.is_none_or(|root| entities.is_subclass(entity, root));
    if !valid {
        return Err(invalid(format!("Invalid type '{path}'.")));
    }

    Ok(entity)
}
