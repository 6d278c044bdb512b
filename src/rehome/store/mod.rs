//! # Storage Layer
//!
//! The import pipeline owns no storage. Every entity it produces is handed to
//! one of two collaborators, each behind a trait so the pipeline can run against
//! real storage or against memory in tests.
//!
//! - [`Vfs`]: the hierarchical file storage. Directories and files are addressed
//!   by clean absolute paths (`/Photos/Trip/a.jpg`) or by parent id + name.
//! - [`DocStore`]: the structured document store. Documents are addressed by
//!   `(doctype, id)`; the store assigns identifiers and revisions.
//!
//! ## Error contract
//!
//! Implementations report a missing path as [`RehomeError::NotFound`] and a name
//! already taken in a directory as [`RehomeError::Conflict`]. The pipeline relies
//! on both: missing parents are created on demand, and a file name collision is
//! retried once under a new name.
//!
//! ## Revisions
//!
//! Revisions look like `<generation>-<hex>`. Creation yields generation 1 and
//! every update bumps it; an update carrying a stale revision is a conflict.
//!
//! ## Implementations
//!
//! - [`memory::MemVfs`], [`memory::MemDocStore`]: in-memory, for tests.
//! - [`fs::FsVfs`], [`fs::FsDocStore`]: backed by a directory on disk.
//!
//! ## Storage Layout (filesystem implementations)
//!
//! ```text
//! <files root>/
//! ├── .rehome/index.json        # Entity metadata cache (ids, mime, references)
//! └── ...                       # The user's tree, as plain files
//!
//! <docs root>/
//! └── <doctype>/<id>.json       # One file per document
//! ```

use crate::error::{RehomeError, Result};
use crate::model::{DirDoc, Doc, FileDoc};
use std::io::Write;
use uuid::Uuid;

pub mod fs;
pub mod memory;

/// An open file being written by [`Vfs::create_file`].
pub trait FileWriter: Write {
    /// Finishes the file and makes it visible. Fails if the number of bytes
    /// written differs from the declared size.
    fn close(self) -> Result<FileDoc>;
}

/// Abstract interface for the hierarchical file storage.
pub trait Vfs {
    type Writer: FileWriter;

    fn dir_by_path(&self, path: &str) -> Result<DirDoc>;

    fn file_by_path(&self, path: &str) -> Result<FileDoc>;

    /// Creates `name` under `parent`. The parent must exist.
    fn create_dir(&mut self, parent: &DirDoc, name: &str) -> Result<DirDoc>;

    /// Opens a new file described by `doc` (its `dir_id` names the parent).
    fn create_file(&mut self, doc: &FileDoc) -> Result<Self::Writer>;

    /// Persists metadata changes (e.g. back-references) of an existing file.
    fn update_file(&mut self, doc: &FileDoc) -> Result<FileDoc>;

    /// Writes buffered metadata out. Stores that persist eagerly have nothing
    /// to do.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Abstract interface for the structured document store.
pub trait DocStore {
    /// Assigns an id and a first revision to `doc` and stores it.
    fn create_doc(&mut self, doc: &mut dyn Doc) -> Result<()>;

    /// Stores a new revision of an existing document.
    fn update_doc(&mut self, doc: &mut dyn Doc) -> Result<()>;

    fn get_doc(&self, doctype: &str, id: &str) -> Result<serde_json::Value>;

    fn all_docs(&self, doctype: &str) -> Result<Vec<serde_json::Value>>;
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The revision following `rev` (`None` for a new document).
pub(crate) fn next_rev(rev: Option<&str>) -> Result<String> {
    let generation = match rev {
        None => 0,
        Some(rev) => rev
            .split_once('-')
            .and_then(|(generation, _)| generation.parse::<u64>().ok())
            .ok_or_else(|| RehomeError::Store(format!("Malformed revision: {}", rev)))?,
    };
    Ok(format!("{}-{}", generation + 1, new_id()))
}

pub(crate) fn check_new_doc(doc: &dyn Doc) -> Result<()> {
    if doc.id().is_some() || doc.rev().is_some() {
        return Err(RehomeError::Store(format!(
            "A new {} document must not carry an id or revision",
            doc.doctype()
        )));
    }
    Ok(())
}
