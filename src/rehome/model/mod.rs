//! # Entity Codecs
//!
//! Typed representations of everything the import pipeline hands over to the
//! storage collaborators. Nothing in here performs I/O.
//!
//! Documents follow the document-store convention of carrying their identity
//! inline as `_id` / `_rev`. Both are assigned by the [`DocStore`] on creation,
//! so every codec exposes an explicit `normalize` step that clears them before
//! a record read from an archive is re-submitted.
//!
//! [`DocStore`]: crate::store::DocStore

use crate::error::Result;
use serde::{Deserialize, Serialize};

pub mod contact;
pub mod doc;
pub mod vfs;

pub use contact::{Contact, ContactAddress, ContactEmail, ContactName, ContactPhone};
pub use doc::JsonDoc;
pub use vfs::{DirDoc, FileDoc, ROOT_DIR_ID};

pub const CONTACTS_DOCTYPE: &str = "io.cozy.contacts";
pub const ALBUMS_DOCTYPE: &str = "io.cozy.photos.albums";

/// A link from one entity to another document, e.g. a photo to its album.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocReference {
    pub id: String,
    #[serde(rename = "type")]
    pub doctype: String,
}

impl DocReference {
    pub fn new(id: impl Into<String>, doctype: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            doctype: doctype.into(),
        }
    }
}

/// A document persisted through the [`DocStore`](crate::store::DocStore).
pub trait Doc {
    fn doctype(&self) -> &str;
    fn id(&self) -> Option<&str>;
    fn rev(&self) -> Option<&str>;
    fn set_id(&mut self, id: Option<String>);
    fn set_rev(&mut self, rev: Option<String>);

    /// The stored JSON form, `_id` and `_rev` included when set.
    fn to_json(&self) -> Result<serde_json::Value>;
}
