//! Read-side document backends.
//!
//! Documents are keyed by the encoded `id` field; polymorphic documents keep
//! their `type` field so reads can be routed back to the right serializer.

mod memory;

pub use memory::MemoryBackend;

use crate::{error::Error, value::Record, value::Value};
use derive_more::Display;

///
/// Backend
///
/// Sink for denormalized documents.
///

pub trait Backend {
    fn added(&mut self, collection: &str, doc_id: &Value, doc: Record) -> Result<(), Error>;

    fn changed(&mut self, collection: &str, doc_id: &Value, doc: Record) -> Result<(), Error>;

    fn deleted(&mut self, collection: &str, doc_id: &Value) -> Result<(), Error>;

    /// Read a stored document back; `None` when the backend does not hold it.
    fn get_doc(&self, collection: &str, doc_id: &Value) -> Result<Option<Record>, Error>;
}

///
/// ActionKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ActionKind {
    #[display("ADD")]
    Add,
    #[display("CHANGE")]
    Change,
    #[display("DELETE")]
    Delete,
}

///
/// Action
/// One logged backend operation.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub collection: String,
    pub doc_id: Value,
    pub doc: Option<Record>,
}

///
/// OpLogBackend
///
/// Backend that only records the operations applied to it.
/// Documents are never read back.
///

#[derive(Debug, Default)]
pub struct OpLogBackend {
    oplog: Vec<Action>,
}

impl OpLogBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the logged operations, leaving the log empty.
    pub fn flush_oplog(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.oplog)
    }

    fn log(&mut self, kind: ActionKind, collection: &str, doc_id: &Value, doc: Option<Record>) {
        log::debug!("{kind} {collection}/{doc_id}");
        self.oplog.push(Action {
            kind,
            collection: collection.to_string(),
            doc_id: doc_id.clone(),
            doc,
        });
    }
}

impl Backend for OpLogBackend {
    fn added(&mut self, collection: &str, doc_id: &Value, doc: Record) -> Result<(), Error> {
        self.log(ActionKind::Add, collection, doc_id, Some(doc));
        Ok(())
    }

    fn changed(&mut self, collection: &str, doc_id: &Value, doc: Record) -> Result<(), Error> {
        self.log(ActionKind::Change, collection, doc_id, Some(doc));
        Ok(())
    }

    fn deleted(&mut self, collection: &str, doc_id: &Value) -> Result<(), Error> {
        self.log(ActionKind::Delete, collection, doc_id, None);
        Ok(())
    }

    fn get_doc(&self, _collection: &str, _doc_id: &Value) -> Result<Option<Record>, Error> {
        Ok(None)
    }
}
