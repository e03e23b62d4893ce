use crate::{config::ConfigError, serializer::FieldErrors};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error for the read-side engine.
/// Every failure surfaces at declaration, construction or first use.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Stable classification independent of message text.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Configuration(_) => ErrorClass::Configuration,
            Self::Lookup(_) => ErrorClass::NotFound,
            Self::Codec(CodecError::Invalid(_)) => ErrorClass::Invalid,
            Self::Codec(_) => ErrorClass::Unsupported,
            Self::Config(_) => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }

    /// Per-field decode errors, if this is an invalid-record failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Codec(CodecError::Invalid(errors)) => Some(errors),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ConfigurationError
///
/// Hard wiring mistakes in entity or serializer declarations.
/// Never retried; callers are expected to crash at startup.
///

#[derive(Debug, ThisError)]
pub enum ConfigurationError {
    // entities
    #[error("entity '{entity}' is already declared")]
    DuplicateEntity { entity: String },

    #[error("entity '{entity}' declares unknown base '{base}'")]
    UnknownBase { entity: String, base: String },

    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("entity '{entity}' declares reserved field '{field}'")]
    ReservedField { entity: String, field: String },

    #[error("entity '{entity}' mixes plain and polymorphic CQRS bases")]
    MixedFamily { entity: String },

    #[error("entity '{entity}' is concrete but does not derive from a CQRS marker")]
    NotCqrs { entity: String },

    #[error("entity '{entity}' has more than one concrete CQRS base: {}", .bases.join(", "))]
    MultipleConcreteBases { entity: String, bases: Vec<String> },

    #[error("proxy entity '{entity}' cannot declare fields")]
    ProxyWithFields { entity: String },

    // serializers
    #[error("cannot create serializer '{serializer}' for abstract or proxy entity '{entity}'")]
    NotConcrete { serializer: String, entity: String },

    #[error("serializer '{serializer}' targets unknown entity '{entity}'")]
    UnknownModel { serializer: String, entity: String },

    #[error(
        "serializer '{serializer}' for '{entity}' has base '{base}', expected '{expected}'"
    )]
    InvalidBase {
        serializer: String,
        entity: String,
        base: String,
        expected: String,
    },

    #[error("serializer '{serializer}' sets both fields and exclude")]
    FieldsAndExclude { serializer: String },

    #[error("serializer '{serializer}' names field '{field}' which '{entity}' does not contribute")]
    FieldNotLocal {
        serializer: String,
        entity: String,
        field: String,
    },

    #[error("serializer '{serializer}' cannot exclude reserved field '{field}'")]
    ExcludeReserved { serializer: String, field: String },

    #[error("serializer '{serializer}' declares field '{field}' more than once")]
    DuplicateDeclaredField { serializer: String, field: String },

    #[error("serializer '{serializer}' declares reserved field '{field}'")]
    DeclaredReserved { serializer: String, field: String },

    #[error("there is already a serializer '{existing}' for '{entity}' (got '{serializer}')")]
    AlreadyRegistered {
        entity: String,
        existing: String,
        serializer: String,
    },

    // collections
    #[error(
        "collection '{collection}' uses model '{entity}' which is derived from \
         'CqrsPolymorphicModel' (not a permitted base)"
    )]
    PolymorphicModelInPlainCollection { collection: String, entity: String },

    #[error(
        "collection '{collection}' uses model '{entity}' which is not derived from \
         'CqrsPolymorphicModel'"
    )]
    PlainModelInPolymorphicCollection { collection: String, entity: String },

    #[error("collection '{collection}' targets unknown entity '{entity}'")]
    UnknownCollectionModel { collection: String, entity: String },

    #[error("collection '{collection}' is already registered")]
    DuplicateCollection { collection: String },

    #[error("there is already a subcollection '{existing}' for '{entity}'")]
    DuplicateSubCollection { entity: String, existing: String },

    #[error("collection '{collection}' uses the reserved document collection name '{name}'")]
    ReservedCollectionName { collection: String, name: String },

    // startup
    #[error("app '{app}' declares entity '{entity}' with a different app label")]
    ForeignModel { app: String, entity: String },
}

///
/// LookupError
///

#[derive(Debug, ThisError)]
pub enum LookupError {
    #[error("unknown entity path '{0}'")]
    UnknownEntityPath(String),

    #[error("invalid type '{0}': no entity registered for that path")]
    UnknownTypePath(String),

    #[error("unknown serializer id {0}")]
    UnknownSerializer(u32),

    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("no collection is registered for the hierarchy of '{0}'")]
    NoRootCollection(String),
}

///
/// CodecError
///

#[derive(Debug, ThisError)]
pub enum CodecError {
    #[error("invalid record: {0}")]
    Invalid(FieldErrors),

    #[error("instance of '{entity}' has no attribute '{attr}'")]
    MissingAttribute { entity: String, attr: String },

    #[error("serializer '{serializer}' cannot represent an instance of '{entity}'")]
    NotInstance { serializer: String, entity: String },

    #[error("root serializer '{serializer}' has no model and cannot encode or decode")]
    RootSerializer { serializer: String },

    #[error("document {doc_id} in '{collection}' already has a field named '{key}'")]
    DocumentKeyTaken {
        collection: String,
        doc_id: String,
        key: String,
    },
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    NotFound,
    Invalid,
    Unsupported,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Unsupported => "unsupported",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}
