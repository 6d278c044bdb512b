use super::{check_new_doc, new_id, next_rev, DocStore, FileWriter, Vfs};
use crate::error::{RehomeError, Result};
use crate::model::{DirDoc, Doc, FileDoc, ROOT_DIR_ID};
use crate::paths;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use uuid::Uuid;

const INDEX_DIR: &str = ".rehome";
const INDEX_FILE: &str = "index.json";

/// Metadata cache for a [`FsVfs`], keyed by full VFS path.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    #[serde(default)]
    dirs: HashMap<String, DirDoc>,
    #[serde(default)]
    files: HashMap<String, FileDoc>,
    /// Entity id → full path, for dirs and files alike.
    #[serde(skip)]
    paths_by_id: HashMap<String, String>,
    /// Set by every mutation, cleared once written to disk.
    #[serde(skip)]
    dirty: bool,
}

impl Index {
    fn load(root: &Path) -> Result<Self> {
        let path = index_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let mut index: Index = serde_json::from_str(&content)?;
        index.paths_by_id = index
            .dirs
            .iter()
            .map(|(path, d)| (d.id.clone(), path.clone()))
            .chain(
                index
                    .files
                    .iter()
                    .filter_map(|(path, f)| f.id.clone().map(|id| (id, path.clone()))),
            )
            .collect();
        Ok(index)
    }

    fn save(&mut self, root: &Path) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let dir = root.join(INDEX_DIR);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(&index_path(root), content.as_bytes())?;
        self.dirty = false;
        Ok(())
    }

    fn insert_dir(&mut self, dir: DirDoc) {
        self.paths_by_id.insert(dir.id.clone(), dir.fullpath.clone());
        self.dirs.insert(dir.fullpath.clone(), dir);
        self.dirty = true;
    }

    fn insert_file(&mut self, path: String, file: FileDoc) {
        if let Some(id) = &file.id {
            self.paths_by_id.insert(id.clone(), path.clone());
        }
        self.files.insert(path, file);
        self.dirty = true;
    }

    fn dir_by_id(&self, id: &str) -> Result<DirDoc> {
        if id == ROOT_DIR_ID {
            return Ok(DirDoc::root());
        }
        self.paths_by_id
            .get(id)
            .and_then(|path| self.dirs.get(path))
            .cloned()
            .ok_or_else(|| RehomeError::NotFound(id.to_string()))
    }

    fn file_path_by_id(&self, id: &str) -> Option<String> {
        self.paths_by_id
            .get(id)
            .filter(|path| self.files.contains_key(*path))
            .cloned()
    }
}

fn index_path(root: &Path) -> PathBuf {
    root.join(INDEX_DIR).join(INDEX_FILE)
}

/// Writes to a temp file next to `path`, then renames it into place.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(".write-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn is_internal(path: &str) -> bool {
    paths::segments(path).first().map(String::as_str) == Some(INDEX_DIR)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

/// File storage backed by a directory on disk.
///
/// Files and directories are plain filesystem entries under `root`; their
/// identity and metadata live in `.rehome/index.json`. The index is read once
/// when the store is opened and kept in memory. Changes reach disk on
/// [`Vfs::flush`], or when the store is dropped. Entries that exist on disk but
/// not in the index (e.g. a destination that predates the import) are adopted
/// the first time they are looked up.
pub struct FsVfs {
    root: PathBuf,
    index: Rc<RefCell<Index>>,
}

impl FsVfs {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        let index = Index::load(&root)?;
        Ok(Self {
            root,
            index: Rc::new(RefCell::new(index)),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a VFS path lives on disk.
    pub fn real_path(&self, path: &str) -> PathBuf {
        let rel = paths::clean_relative(path);
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }
}

impl Drop for FsVfs {
    fn drop(&mut self) {
        if let Err(e) = self.index.borrow_mut().save(&self.root) {
            tracing::warn!(root = %self.root.display(), error = %e, "Can't save file index");
        }
    }
}

impl Vfs for FsVfs {
    type Writer = FsFileWriter;

    fn dir_by_path(&self, path: &str) -> Result<DirDoc> {
        let path = paths::clean(path);
        if path == "/" {
            return Ok(DirDoc::root());
        }
        if is_internal(&path) || !self.real_path(&path).is_dir() {
            return Err(RehomeError::NotFound(path));
        }

        if let Some(dir) = self.index.borrow().dirs.get(&path) {
            return Ok(dir.clone());
        }

        // Adopt a directory created outside of this store
        let (parent_path, name) = paths::split(&path);
        let parent = self.dir_by_path(&parent_path)?;
        let dir = DirDoc::new(new_id(), &parent, &name)?;
        self.index.borrow_mut().insert_dir(dir.clone());
        Ok(dir)
    }

    fn file_by_path(&self, path: &str) -> Result<FileDoc> {
        let path = paths::clean(path);
        let real = self.real_path(&path);
        if is_internal(&path) || !real.is_file() {
            return Err(RehomeError::NotFound(path));
        }

        if let Some(file) = self.index.borrow().files.get(&path) {
            return Ok(file.clone());
        }

        // Adopt a file created outside of this store
        let (parent_path, name) = paths::split(&path);
        let parent = self.dir_by_path(&parent_path)?;
        let meta = fs::metadata(&real)?;
        let (mime, class) = crate::mime::from_filename(&name);
        let mut doc = FileDoc::new(
            &name,
            &parent.id,
            meta.len(),
            &mime,
            &class,
            Utc::now(),
            is_executable(&meta),
            false,
        )?;
        doc.id = Some(new_id());
        doc.rev = Some(next_rev(None)?);
        self.index.borrow_mut().insert_file(path, doc.clone());
        Ok(doc)
    }

    fn create_dir(&mut self, parent: &DirDoc, name: &str) -> Result<DirDoc> {
        let dir = DirDoc::new(new_id(), parent, name)?;
        if is_internal(&dir.fullpath) {
            return Err(RehomeError::Conflict(dir.fullpath));
        }
        if !self.real_path(&parent.fullpath).is_dir() {
            return Err(RehomeError::NotFound(parent.fullpath.clone()));
        }

        match fs::create_dir(self.real_path(&dir.fullpath)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RehomeError::Conflict(dir.fullpath));
            }
            Err(e) => return Err(RehomeError::Io(e)),
        }

        self.index.borrow_mut().insert_dir(dir.clone());
        Ok(dir)
    }

    fn create_file(&mut self, doc: &FileDoc) -> Result<FsFileWriter> {
        crate::model::vfs::check_name(&doc.name)?;
        let parent = self.index.borrow().dir_by_id(&doc.dir_id)?;
        let path = paths::join(&parent.fullpath, &doc.name);
        if is_internal(&path) {
            return Err(RehomeError::Conflict(path));
        }

        let real = self.real_path(&path);
        let file = match OpenOptions::new().write(true).create_new(true).open(&real) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RehomeError::Conflict(path));
            }
            Err(e) => return Err(RehomeError::Io(e)),
        };

        let mut doc = doc.clone();
        doc.id = Some(new_id());
        doc.rev = Some(next_rev(None)?);
        Ok(FsFileWriter {
            file,
            doc,
            path,
            real,
            index: Rc::clone(&self.index),
            written: 0,
        })
    }

    fn update_file(&mut self, doc: &FileDoc) -> Result<FileDoc> {
        let id = doc
            .id
            .as_deref()
            .ok_or_else(|| RehomeError::Store("Cannot update a file without id".to_string()))?;
        let mut index = self.index.borrow_mut();
        let path = index
            .file_path_by_id(id)
            .ok_or_else(|| RehomeError::NotFound(id.to_string()))?;
        let stored_rev = index.files.get(&path).and_then(|f| f.rev.clone());
        if stored_rev != doc.rev {
            return Err(RehomeError::Conflict(format!("stale revision for {}", path)));
        }

        let mut updated = doc.clone();
        updated.rev = Some(next_rev(doc.rev.as_deref())?);
        updated.updated_at = Utc::now();
        index.insert_file(path, updated.clone());
        Ok(updated)
    }

    fn flush(&mut self) -> Result<()> {
        self.index.borrow_mut().save(&self.root)
    }
}

pub struct FsFileWriter {
    file: File,
    doc: FileDoc,
    path: String,
    real: PathBuf,
    index: Rc<RefCell<Index>>,
    written: u64,
}

impl Write for FsFileWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.file.write(data)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl FileWriter for FsFileWriter {
    fn close(self) -> Result<FileDoc> {
        let FsFileWriter {
            file,
            doc,
            path,
            real,
            index,
            written,
        } = self;

        file.sync_all()?;
        drop(file);

        if written != doc.size {
            // Leave nothing half-written behind
            let _ = fs::remove_file(&real);
            return Err(RehomeError::ContentLengthMismatch {
                name: doc.name,
                expected: doc.size,
                written,
            });
        }
        if doc.executable {
            set_executable(&real)?;
        }

        index.borrow_mut().insert_file(path, doc.clone());
        Ok(doc)
    }
}


/// Document store keeping one JSON file per document under
/// `<root>/<doctype>/<id>.json`.
pub struct FsDocStore {
    root: PathBuf,
}

impl FsDocStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    fn doc_path(&self, doctype: &str, id: &str) -> Result<PathBuf> {
        crate::model::vfs::check_name(doctype)?;
        crate::model::vfs::check_name(id)?;
        Ok(self.root.join(doctype).join(format!("{}.json", id)))
    }

    fn write_doc(&self, doc: &dyn Doc) -> Result<()> {
        let id = doc
            .id()
            .ok_or_else(|| RehomeError::Store("Document has no id".to_string()))?;
        let path = self.doc_path(doc.doctype(), id)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(&doc.to_json()?)?;
        write_atomic(&path, content.as_bytes())
    }
}

impl DocStore for FsDocStore {
    fn create_doc(&mut self, doc: &mut dyn Doc) -> Result<()> {
        check_new_doc(doc)?;
        doc.set_id(Some(new_id()));
        doc.set_rev(Some(next_rev(None)?));
        if let Err(e) = self.write_doc(doc) {
            doc.set_id(None);
            doc.set_rev(None);
            return Err(e);
        }
        Ok(())
    }

    fn update_doc(&mut self, doc: &mut dyn Doc) -> Result<()> {
        let id = doc
            .id()
            .map(str::to_string)
            .ok_or_else(|| RehomeError::Store("Cannot update a document without id".to_string()))?;
        let stored = self.get_doc(doc.doctype(), &id)?;
        if stored.get("_rev").and_then(Value::as_str) != doc.rev() {
            return Err(RehomeError::Conflict(format!("stale revision for {}", id)));
        }

        let previous = doc.rev().map(str::to_string);
        doc.set_rev(Some(next_rev(previous.as_deref())?));
        if let Err(e) = self.write_doc(doc) {
            doc.set_rev(previous);
            return Err(e);
        }
        Ok(())
    }

    fn get_doc(&self, doctype: &str, id: &str) -> Result<Value> {
        let path = self.doc_path(doctype, id)?;
        if !path.exists() {
            return Err(RehomeError::NotFound(format!("{}/{}", doctype, id)));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn all_docs(&self, doctype: &str) -> Result<Vec<Value>> {
        crate::model::vfs::check_name(doctype)?;
        let dir = self.root.join(doctype);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut docs = Vec::with_capacity(files.len());
        for path in files {
            let content = fs::read_to_string(path)?;
            docs.push(serde_json::from_str(&content)?);
        }
        Ok(docs)
    }
}
