use super::Doc;
use crate::error::{RehomeError, Result};
use serde_json::{Map, Value};

/// A schemaless document, kept as its raw JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDoc {
    doctype: String,
    id: Option<String>,
    rev: Option<String>,
    pub fields: Map<String, Value>,
}

impl JsonDoc {
    pub fn new(doctype: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            doctype: doctype.into(),
            id: None,
            rev: None,
            fields,
        }
    }

    /// Builds a document from one exported record.
    ///
    /// The record's `_id` is detached and returned as the archive-local id
    /// (`None` when absent, empty or not a string). `_rev` and the `type`
    /// discriminator are dropped, so the result is ready to be created fresh
    /// in the document store.
    pub fn from_archive_record(doctype: &str, record: Value) -> Result<(Option<String>, Self)> {
        let Value::Object(mut fields) = record else {
            return Err(RehomeError::InvalidRecord {
                line: 0,
                message: format!("expected a JSON object for a {} record", doctype),
            });
        };

        let local_id = match fields.remove("_id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id),
            _ => None,
        };

        let mut doc = Self::new(doctype, fields);
        doc.normalize();
        Ok((local_id, doc))
    }

    /// Removes identity and discriminator fields from the payload.
    pub fn normalize(&mut self) {
        self.fields.remove("_id");
        self.fields.remove("_rev");
        self.fields.remove("type");
        self.id = None;
        self.rev = None;
    }
}

impl Doc for JsonDoc {
    fn doctype(&self) -> &str {
        &self.doctype
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn set_rev(&mut self, rev: Option<String>) {
        self.rev = rev;
    }

    fn to_json(&self) -> Result<Value> {
        let mut fields = self.fields.clone();
        if let Some(id) = &self.id {
            fields.insert("_id".to_string(), Value::String(id.clone()));
        }
        if let Some(rev) = &self.rev {
            fields.insert("_rev".to_string(), Value::String(rev.clone()));
        }
        Ok(Value::Object(fields))
    }
}
