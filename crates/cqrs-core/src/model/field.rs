use crate::value::Value;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FieldModel
/// Runtime field metadata declared on an entity.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FieldModel {
    /// Field name as used in records.
    pub name: String,
    /// Value shape accepted on decode.
    pub kind: FieldKind,

    #[serde(default)]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldModel {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            default: None,
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    #[must_use]
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    #[must_use]
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    #[must_use]
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

///
/// FieldKind
///
/// Minimal type surface needed to coerce decoded values.
/// Encoding never coerces; the instance is trusted.
///

#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum FieldKind {
    /// Any value, passed through untouched.
    Any,
    Bool,
    Float,
    Int,
    #[display("List<{_0}>")]
    List(Box<Self>),
    Text,
    Uint,
}

impl FieldKind {
    /// Coerce a decoded value into this kind.
    ///
    /// `Null` is handled by the caller (nullability is a field property).
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        let coerced = match (self, value) {
            (Self::Any, v) => Some(v.clone()),
            (Self::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (Self::Int, v) => v.as_i64().map(Value::Int),
            (Self::Uint, v) => v.as_u64().map(Value::Uint),
            (Self::Float, Value::Float(f)) => Some(Value::Float(*f)),
            #[expect(clippy::cast_precision_loss)]
            (Self::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
            #[expect(clippy::cast_precision_loss)]
            (Self::Float, Value::Uint(u)) => Some(Value::Float(*u as f64)),
            (Self::Text, Value::Text(s)) => Some(Value::Text(s.clone())),
            (Self::List(inner), Value::List(items)) => {
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        inner
                            .coerce(item)
                            .map_err(|msg| format!("item {i}: {msg}"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Some(Value::List(items))
            }
            _ => None,
        };

        coerced.ok_or_else(|| format!("expected {self}, got {}", value.kind_label()))
    }
}
