use crate::{
    ID_FIELD,
    backend::Backend,
    config::CqrsConfig,
    error::{CodecError, Error},
    value::{Record, Value},
};
use std::collections::{BTreeMap, HashMap};

///
/// MemoryBackend
///
/// In-memory document store. Documents are stored with the `id` field
/// renamed to the configured document key and restored on read.
///
/// Documents are keyed by the JSON form of their id, so `1` and `"1"` are
/// different documents.
///

#[derive(Debug)]
pub struct MemoryBackend {
    db_name: String,
    connection_uri: String,
    id_key: String,
    collections: HashMap<String, BTreeMap<String, Record>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(config: &CqrsConfig) -> Self {
        log::debug!(
            "memory backend for '{}' standing in for {}",
            config.document_db_name,
            config.connection_uri,
        );

        Self {
            db_name: config.document_db_name.clone(),
            connection_uri: config.connection_uri.clone(),
            id_key: config.document_id_key.clone(),
            collections: HashMap::new(),
        }
    }

    #[must_use]
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Connection the store stands in for.
    #[must_use]
    pub fn connection_uri(&self) -> &str {
        &self.connection_uri
    }

    /// Stored form of a document, with the id under the document key.
    #[must_use]
    pub fn raw(&self, collection: &str, doc_id: &Value) -> Option<&Record> {
        self.collections.get(collection)?.get(&doc_key(doc_id))
    }

    /// Number of documents in a collection.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, BTreeMap::len)
    }

    fn store(&mut self, collection: &str, doc_id: &Value, mut doc: Record) -> Result<(), Error> {
        if self.id_key != ID_FIELD && doc.contains_key(&self.id_key) {
            return Err(CodecError::DocumentKeyTaken {
                collection: collection.to_string(),
                doc_id: doc_key(doc_id),
                key: self.id_key.clone(),
            }
            .into());
        }
        doc.rename(ID_FIELD, &self.id_key);

        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(doc_key(doc_id), doc);

        Ok(())
    }
}

// doc_key
// type-aware storage key for a document id
fn doc_key(doc_id: &Value) -> String {
    doc_id.to_json().to_string()
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(&CqrsConfig::default())
    }
}

impl Backend for MemoryBackend {
    fn added(&mut self, collection: &str, doc_id: &Value, doc: Record) -> Result<(), Error> {
        self.store(collection, doc_id, doc)
    }

    fn changed(&mut self, collection: &str, doc_id: &Value, doc: Record) -> Result<(), Error> {
        self.store(collection, doc_id, doc)
    }

    fn deleted(&mut self, collection: &str, doc_id: &Value) -> Result<(), Error> {
        if let Some(docs) = self.collections.get_mut(collection) {
            docs.remove(&doc_key(doc_id));
        }
        Ok(())
    }

    fn get_doc(&self, collection: &str, doc_id: &Value) -> Result<Option<Record>, Error> {
        Ok(self.raw(collection, doc_id).map(|stored| {
            let mut doc = stored.clone();
            doc.rename(&self.id_key, ID_FIELD);
            doc
        }))
    }
}
