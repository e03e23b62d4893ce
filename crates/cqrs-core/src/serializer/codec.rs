use crate::{
    error::{CodecError, Error},
    model::{EntityId, EntityMarker},
    serializer::{FieldSource, Serializer, SerializerId, SerializerRegistry, type_field},
    traits::EntityInstance,
    value::{Record, Value},
};
use indexmap::IndexMap;
use std::{fmt, sync::Arc};

///
/// FieldErrors
///
/// Decode errors grouped by field name, in the order they were found.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrors(IndexMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, messages)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}: {}", messages.join(" "))?;
        }

        Ok(())
    }
}

///
/// Decoded
///
/// Result of decoding a record: the serializer that actually decoded it,
/// its target entity, and the coerced writable values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub serializer: SerializerId,
    pub entity: EntityId,
    pub values: Record,
}

impl SerializerRegistry {
    /// Encode an instance into a record.
    ///
    /// Polymorphic serializers hand the instance to the serializer of its
    /// runtime entity, deriving it if needed.
    pub fn encode(
        &self,
        serializer: SerializerId,
        instance: &dyn EntityInstance,
    ) -> Result<Record, Error> {
        let serializer = self.get(serializer)?;
        let entity = self.entities().resolve_path(instance.entity_path())?;

        let not_instance = || {
            Error::from(CodecError::NotInstance {
                serializer: serializer.name().to_string(),
                entity: instance.entity_path().to_string(),
            })
        };

        match serializer.model() {
            None if serializer.family() == EntityMarker::Plain => {
                Err(CodecError::RootSerializer {
                    serializer: serializer.name().to_string(),
                }
                .into())
            }
            None => {
                if !self.entities().is_polymorphic(entity) {
                    return Err(not_instance());
                }
                let dispatched = self.for_entity(entity)?;

                encode_with(&dispatched, instance)
            }
            Some(model) => {
                if !self.entities().is_subclass(entity, model) {
                    return Err(not_instance());
                }
                if serializer.is_polymorphic() && entity != model {
                    let dispatched = self.for_entity(entity)?;
                    return encode_with(&dispatched, instance);
                }

                encode_with(&serializer, instance)
            }
        }
    }

    /// Decode a record into coerced writable values.
    ///
    /// Polymorphic serializers read `type` first and decode with the
    /// serializer of the named entity. `id` and read-only fields are never
    /// decoded.
    pub fn decode(&self, serializer: SerializerId, record: &Record) -> Result<Decoded, Error> {
        let serializer = self.get(serializer)?;

        let target = if serializer.is_polymorphic() {
            let entity = type_field::resolve_type(self.entities(), record, serializer.model())?;
            if serializer.model() == Some(entity) {
                serializer
            } else {
                self.for_entity(entity)?
            }
        } else if serializer.is_root() {
            return Err(CodecError::RootSerializer {
                serializer: serializer.name().to_string(),
            }
            .into());
        } else {
            serializer
        };

        decode_with(&target, record)
    }
}

fn encode_with(serializer: &Serializer, instance: &dyn EntityInstance) -> Result<Record, Error> {
    let mut record = Record::new();

    for field in serializer.fields() {
        let value = match &field.source {
            FieldSource::Id => instance.id(),
            FieldSource::TypePath => Value::Text(instance.type_path()),
            FieldSource::Attr(attr) => {
                instance
                    .attr(attr)
                    .ok_or_else(|| CodecError::MissingAttribute {
                        entity: instance.entity_path().to_string(),
                        attr: attr.clone(),
                    })?
            }
        };
        record.insert(field.name.clone(), value);
    }

    Ok(record)
}

fn decode_with(serializer: &Arc<Serializer>, record: &Record) -> Result<Decoded, Error> {
    let Some(entity) = serializer.model() else {
        return Err(CodecError::RootSerializer {
            serializer: serializer.name().to_string(),
        }
        .into());
    };

    let mut values = Record::new();
    let mut errors = FieldErrors::new();

    for field in serializer.fields().iter().filter(|f| !f.read_only) {
        let name = field.name.as_str();

        match record.get(name) {
            None if field.required() => errors.add(name, "This field is required."),
            None => {
                values.insert(name, field.default.clone().unwrap_or(Value::Null));
            }
            Some(Value::Null) => {
                if field.nullable {
                    values.insert(name, Value::Null);
                } else {
                    errors.add(name, "This field may not be null.");
                }
            }
            Some(value) => match field.kind.coerce(value) {
                Ok(coerced) => {
                    values.insert(name, coerced);
                }
                Err(message) => errors.add(name, message),
            },
        }
    }

    if !errors.is_empty() {
        return Err(CodecError::Invalid(errors).into());
    }

    Ok(Decoded {
        serializer: serializer.id(),
        entity,
        values,
    })
}
