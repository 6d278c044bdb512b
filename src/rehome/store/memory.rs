use super::{check_new_doc, new_id, next_rev, DocStore, FileWriter, Vfs};
use crate::error::{RehomeError, Result};
use crate::model::{DirDoc, Doc, FileDoc, ROOT_DIR_ID};
use crate::paths;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

struct MemFile {
    doc: FileDoc,
    content: Vec<u8>,
}

#[derive(Default)]
struct MemTree {
    dirs: HashMap<String, DirDoc>,
    files: HashMap<String, MemFile>,
    simulate_write_error: bool,
    simulate_close_error: bool,
}

impl MemTree {
    fn name_taken(&self, dir_id: &str, name: &str) -> bool {
        self.dirs
            .values()
            .any(|d| d.dir_id == dir_id && d.name == name)
            || self
                .files
                .values()
                .any(|f| f.doc.dir_id == dir_id && f.doc.name == name)
    }

    fn dir_by_path(&self, path: &str) -> Option<&DirDoc> {
        let path = paths::clean(path);
        self.dirs.values().find(|d| d.fullpath == path)
    }
}

/// In-memory file storage for testing.
///
/// Clones share the same tree, so a test can keep a handle for inspection
/// after giving one to the importer. Single-threaded, hence `Rc<RefCell<_>>`.
#[derive(Clone)]
pub struct MemVfs {
    tree: Rc<RefCell<MemTree>>,
}

impl Default for MemVfs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemVfs {
    pub fn new() -> Self {
        let mut tree = MemTree::default();
        tree.dirs.insert(ROOT_DIR_ID.to_string(), DirDoc::root());
        Self {
            tree: Rc::new(RefCell::new(tree)),
        }
    }

    /// Makes every write to a file opened afterwards fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.tree.borrow_mut().simulate_write_error = simulate;
    }

    /// Makes closing files fail.
    pub fn set_simulate_close_error(&self, simulate: bool) {
        self.tree.borrow_mut().simulate_close_error = simulate;
    }

    /// Content of the file at `path`, if any.
    pub fn content_of(&self, path: &str) -> Option<Vec<u8>> {
        let doc = self.file_by_path(path).ok()?;
        let tree = self.tree.borrow();
        let id = doc.id?;
        tree.files.get(&id).map(|f| f.content.clone())
    }

    /// Full paths of every file, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        let tree = self.tree.borrow();
        let mut out: Vec<String> = tree
            .files
            .values()
            .filter_map(|f| {
                tree.dirs
                    .get(&f.doc.dir_id)
                    .map(|d| paths::join(&d.fullpath, &f.doc.name))
            })
            .collect();
        out.sort();
        out
    }

    /// Full paths of every directory (root included), sorted.
    pub fn dir_paths(&self) -> Vec<String> {
        let tree = self.tree.borrow();
        let mut out: Vec<String> = tree.dirs.values().map(|d| d.fullpath.clone()).collect();
        out.sort();
        out
    }
}

impl Vfs for MemVfs {
    type Writer = MemFileWriter;

    fn dir_by_path(&self, path: &str) -> Result<DirDoc> {
        self.tree
            .borrow()
            .dir_by_path(path)
            .cloned()
            .ok_or_else(|| RehomeError::NotFound(paths::clean(path)))
    }

    fn file_by_path(&self, path: &str) -> Result<FileDoc> {
        let (parent, name) = paths::split(path);
        let tree = self.tree.borrow();
        let dir = tree
            .dir_by_path(&parent)
            .ok_or_else(|| RehomeError::NotFound(paths::clean(path)))?;
        tree.files
            .values()
            .find(|f| f.doc.dir_id == dir.id && f.doc.name == name)
            .map(|f| f.doc.clone())
            .ok_or_else(|| RehomeError::NotFound(paths::clean(path)))
    }

    fn create_dir(&mut self, parent: &DirDoc, name: &str) -> Result<DirDoc> {
        let mut tree = self.tree.borrow_mut();
        if !tree.dirs.contains_key(&parent.id) {
            return Err(RehomeError::NotFound(parent.fullpath.clone()));
        }
        if tree.name_taken(&parent.id, name) {
            return Err(RehomeError::Conflict(paths::join(&parent.fullpath, name)));
        }
        let dir = DirDoc::new(new_id(), parent, name)?;
        tree.dirs.insert(dir.id.clone(), dir.clone());
        Ok(dir)
    }

    fn create_file(&mut self, doc: &FileDoc) -> Result<MemFileWriter> {
        let tree = self.tree.borrow();
        let dir = tree
            .dirs
            .get(&doc.dir_id)
            .ok_or_else(|| RehomeError::NotFound(doc.dir_id.clone()))?;
        if tree.name_taken(&doc.dir_id, &doc.name) {
            return Err(RehomeError::Conflict(paths::join(&dir.fullpath, &doc.name)));
        }

        let mut doc = doc.clone();
        doc.id = Some(new_id());
        doc.rev = Some(next_rev(None)?);
        Ok(MemFileWriter {
            tree: Rc::clone(&self.tree),
            doc,
            buf: Vec::new(),
        })
    }

    fn update_file(&mut self, doc: &FileDoc) -> Result<FileDoc> {
        let mut tree = self.tree.borrow_mut();
        let id = doc
            .id
            .clone()
            .ok_or_else(|| RehomeError::Store("Cannot update a file without id".to_string()))?;
        let stored = tree
            .files
            .get_mut(&id)
            .ok_or_else(|| RehomeError::NotFound(id.clone()))?;
        if stored.doc.rev != doc.rev {
            return Err(RehomeError::Conflict(format!("stale revision for {}", id)));
        }

        let mut updated = doc.clone();
        updated.rev = Some(next_rev(doc.rev.as_deref())?);
        stored.doc = updated.clone();
        Ok(updated)
    }
}

pub struct MemFileWriter {
    tree: Rc<RefCell<MemTree>>,
    doc: FileDoc,
    buf: Vec<u8>,
}

impl Write for MemFileWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.tree.borrow().simulate_write_error {
            return Err(io::Error::other("Simulated write error"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileWriter for MemFileWriter {
    fn close(self) -> Result<FileDoc> {
        let mut tree = self.tree.borrow_mut();
        if tree.simulate_close_error {
            return Err(RehomeError::Store("Simulated close error".to_string()));
        }
        let written = self.buf.len() as u64;
        if written != self.doc.size {
            return Err(RehomeError::ContentLengthMismatch {
                name: self.doc.name.clone(),
                expected: self.doc.size,
                written,
            });
        }
        if tree.name_taken(&self.doc.dir_id, &self.doc.name) {
            return Err(RehomeError::Conflict(self.doc.name.clone()));
        }

        let id = self.doc.id.clone().unwrap_or_else(new_id);
        tree.files.insert(
            id,
            MemFile {
                doc: self.doc.clone(),
                content: self.buf,
            },
        );
        Ok(self.doc)
    }
}

/// In-memory document store for testing. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemDocStore {
    docs: Rc<RefCell<HashMap<(String, String), Value>>>,
    simulate_write_error: Rc<RefCell<bool>>,
}

impl MemDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    pub fn len(&self) -> usize {
        self.docs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.borrow().is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(RehomeError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl DocStore for MemDocStore {
    fn create_doc(&mut self, doc: &mut dyn Doc) -> Result<()> {
        check_new_doc(doc)?;
        self.check_writable()?;

        let id = new_id();
        doc.set_id(Some(id.clone()));
        doc.set_rev(Some(next_rev(None)?));
        let json = doc.to_json()?;
        self.docs
            .borrow_mut()
            .insert((doc.doctype().to_string(), id), json);
        Ok(())
    }

    fn update_doc(&mut self, doc: &mut dyn Doc) -> Result<()> {
        self.check_writable()?;
        let id = doc
            .id()
            .map(str::to_string)
            .ok_or_else(|| RehomeError::Store("Cannot update a document without id".to_string()))?;
        let key = (doc.doctype().to_string(), id.clone());

        let mut docs = self.docs.borrow_mut();
        let stored = docs
            .get(&key)
            .ok_or_else(|| RehomeError::NotFound(format!("{}/{}", key.0, id)))?;
        if stored.get("_rev").and_then(Value::as_str) != doc.rev() {
            return Err(RehomeError::Conflict(format!("stale revision for {}", id)));
        }

        let rev = next_rev(doc.rev())?;
        doc.set_rev(Some(rev));
        docs.insert(key, doc.to_json()?);
        Ok(())
    }

    fn get_doc(&self, doctype: &str, id: &str) -> Result<Value> {
        self.docs
            .borrow()
            .get(&(doctype.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| RehomeError::NotFound(format!("{}/{}", doctype, id)))
    }

    fn all_docs(&self, doctype: &str) -> Result<Vec<Value>> {
        let docs = self.docs.borrow();
        let mut out: Vec<(String, Value)> = docs
            .iter()
            .filter(|((dt, _), _)| dt == doctype)
            .map(|((_, id), v)| (id.clone(), v.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out.into_iter().map(|(_, v)| v).collect())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use chrono::Utc;

    impl MemVfs {
        /// Writes a file directly, creating missing parent directories.
        pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
            let (parent, name) = paths::split(path);
            let dir = crate::commands::dirs::mkdir_all(&mut self, &parent)
                .expect("fixture directory");
            let (mime, class) = crate::mime::from_filename(&name);
            let doc = FileDoc::new(
                &name,
                &dir.id,
                content.len() as u64,
                &mime,
                &class,
                Utc::now(),
                false,
                false,
            )
            .expect("fixture file name");
            let mut writer = self.create_file(&doc).expect("fixture file");
            writer.write_all(content).expect("fixture content");
            writer.close().expect("fixture close");
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocReference, JsonDoc, ALBUMS_DOCTYPE};
    use serde_json::{json, Map};

    fn new_file(dir_id: &str, name: &str, size: u64) -> FileDoc {
        FileDoc::new(
            name,
            dir_id,
            size,
            "text/plain",
            "text",
            chrono::Utc::now(),
            false,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_root_always_exists() {
        let vfs = MemVfs::new();
        assert_eq!(vfs.dir_by_path("/").unwrap().id, ROOT_DIR_ID);
        assert!(vfs.dir_by_path("/missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_dir_conflict() {
        let mut vfs = MemVfs::new();
        let root = vfs.dir_by_path("/").unwrap();
        vfs.create_dir(&root, "Photos").unwrap();

        let err = vfs.create_dir(&root, "Photos").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(vfs.dir_paths(), vec!["/", "/Photos"]);
    }

    #[test]
    fn test_create_file_and_read_back() {
        let mut vfs = MemVfs::new();
        let mut writer = vfs.create_file(&new_file(ROOT_DIR_ID, "a.txt", 5)).unwrap();
        writer.write_all(b"hello").unwrap();
        let doc = writer.close().unwrap();

        assert!(doc.id.is_some());
        assert_eq!(vfs.content_of("/a.txt"), Some(b"hello".to_vec()));
        assert_eq!(vfs.file_by_path("/a.txt").unwrap().id, doc.id);
    }

    #[test]
    fn test_create_file_conflict() {
        let mut vfs = MemVfs::new().with_file("/a.txt", b"x");
        let err = vfs
            .create_file(&new_file(ROOT_DIR_ID, "a.txt", 1))
            .err()
            .unwrap();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_close_checks_length() {
        let mut vfs = MemVfs::new();
        let mut writer = vfs.create_file(&new_file(ROOT_DIR_ID, "a.txt", 10)).unwrap();
        writer.write_all(b"short").unwrap();
        let err = writer.close().unwrap_err();
        assert!(matches!(
            err,
            RehomeError::ContentLengthMismatch {
                expected: 10,
                written: 5,
                ..
            }
        ));
        assert!(vfs.file_paths().is_empty());
    }

    #[test]
    fn test_update_file_bumps_revision() {
        let mut vfs = MemVfs::new().with_file("/a.jpg", b"img");
        let mut doc = vfs.file_by_path("/a.jpg").unwrap();
        doc.add_referenced_by(DocReference::new("album", ALBUMS_DOCTYPE));

        let updated = vfs.update_file(&doc).unwrap();
        assert!(updated.rev.as_deref().unwrap().starts_with("2-"));
        assert_eq!(vfs.file_by_path("/a.jpg").unwrap().referenced_by.len(), 1);

        // The old revision is now stale
        assert!(vfs.update_file(&doc).unwrap_err().is_conflict());
    }

    #[test]
    fn test_doc_store_create_and_update() {
        let mut store = MemDocStore::new();
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("Trip"));
        let mut doc = JsonDoc::new(ALBUMS_DOCTYPE, fields);

        store.create_doc(&mut doc).unwrap();
        let id = doc.id().unwrap().to_string();
        assert!(doc.rev().unwrap().starts_with("1-"));
        assert_eq!(store.get_doc(ALBUMS_DOCTYPE, &id).unwrap()["name"], "Trip");

        doc.fields.insert("name".to_string(), json!("Holidays"));
        store.update_doc(&mut doc).unwrap();
        let stored = store.get_doc(ALBUMS_DOCTYPE, &id).unwrap();
        assert_eq!(stored["name"], "Holidays");
        assert!(stored["_rev"].as_str().unwrap().starts_with("2-"));
    }

    #[test]
    fn test_doc_store_rejects_preset_identity() {
        let mut store = MemDocStore::new();
        let mut doc = JsonDoc::new(ALBUMS_DOCTYPE, Map::new());
        doc.set_id(Some("forced".to_string()));

        assert!(store.create_doc(&mut doc).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_doc_store_simulated_error() {
        let mut store = MemDocStore::new();
        store.set_simulate_write_error(true);
        let mut doc = JsonDoc::new(ALBUMS_DOCTYPE, Map::new());

        assert!(matches!(
            store.create_doc(&mut doc),
            Err(RehomeError::Store(_))
        ));
        assert_eq!(doc.id(), None);
    }
}
