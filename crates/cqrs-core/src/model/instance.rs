use crate::{
    traits::EntityInstance,
    value::{Record, Value},
};

///
/// Instance
///
/// Plain in-memory entity instance: a runtime entity path, a primary key and
/// a bag of attribute values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    path: String,
    id: Value,
    attrs: Record,
}

impl Instance {
    #[must_use]
    pub fn new(path: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
            attrs: Record::new(),
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(attr, value);
        self
    }

    pub fn set(&mut self, attr: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(attr, value);
    }

    #[must_use]
    pub const fn attrs(&self) -> &Record {
        &self.attrs
    }
}

impl EntityInstance for Instance {
    fn entity_path(&self) -> &str {
        &self.path
    }

    fn id(&self) -> Value {
        self.id.clone()
    }

    fn attr(&self, name: &str) -> Option<Value> {
        self.attrs.get(name).cloned()
    }
}
