use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

///
/// Record
///
/// Ordered mapping of field name to value; the structured form of one
/// encoded entity. Field order follows the resolved serializer field order.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, keeping the slot of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Rename a key in place, keeping its position.
    ///
    /// Returns `false` when `from` is absent or `to` is already taken by
    /// another entry; the record is left untouched in both cases.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let Some(index) = self.0.get_index_of(from) else {
            return false;
        };
        if from == to {
            return true;
        }
        if self.0.contains_key(to) {
            return false;
        }
        let Some((_, value)) = self.0.shift_remove_index(index) else {
            return false;
        };
        self.0.shift_insert(index, to.to_string(), value);

        true
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
