use super::DocReference;
use crate::error::{RehomeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the root directory (`/`) in every [`Vfs`](crate::store::Vfs).
pub const ROOT_DIR_ID: &str = "io.cozy.files.root-dir";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirDoc {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Parent directory id; empty for the root.
    pub dir_id: String,
    pub fullpath: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DirDoc {
    pub fn root() -> Self {
        let now = Utc::now();
        Self {
            id: ROOT_DIR_ID.to_string(),
            name: String::new(),
            dir_id: String::new(),
            fullpath: "/".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new(id: String, parent: &DirDoc, name: &str) -> Result<Self> {
        check_name(name)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: name.to_string(),
            dir_id: parent.id.clone(),
            fullpath: crate::paths::join(&parent.fullpath, name),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDoc {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub name: String,
    pub dir_id: String,
    pub size: u64,
    pub mime: String,
    pub class: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub executable: bool,
    pub trashed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<DocReference>,
}

impl FileDoc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        dir_id: &str,
        size: u64,
        mime: &str,
        class: &str,
        now: DateTime<Utc>,
        executable: bool,
        trashed: bool,
    ) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            id: None,
            rev: None,
            name: name.to_string(),
            dir_id: dir_id.to_string(),
            size,
            mime: mime.to_string(),
            class: class.to_string(),
            created_at: now,
            updated_at: now,
            executable,
            trashed,
            referenced_by: Vec::new(),
        })
    }

    /// Records that `reference` points at this file. Returns false if it
    /// was already recorded.
    pub fn add_referenced_by(&mut self, reference: DocReference) -> bool {
        if self.referenced_by.contains(&reference) {
            return false;
        }
        self.referenced_by.push(reference);
        true
    }
}

/// Rejects names that cannot be a single path segment.
pub fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(RehomeError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ALBUMS_DOCTYPE;

    fn file(name: &str) -> Result<FileDoc> {
        FileDoc::new(name, ROOT_DIR_ID, 3, "text/plain", "text", Utc::now(), false, false)
    }

    #[test]
    fn test_file_name_validation() {
        assert!(file("notes.txt").is_ok());
        assert!(matches!(file(""), Err(RehomeError::InvalidName(_))));
        assert!(matches!(file(".."), Err(RehomeError::InvalidName(_))));
        assert!(matches!(file("a/b"), Err(RehomeError::InvalidName(_))));
    }

    #[test]
    fn test_add_referenced_by_is_idempotent() {
        let mut doc = file("photo.jpg").unwrap();
        let reference = DocReference::new("album-1", ALBUMS_DOCTYPE);

        assert!(doc.add_referenced_by(reference.clone()));
        assert!(!doc.add_referenced_by(reference));
        assert_eq!(doc.referenced_by.len(), 1);
    }

    #[test]
    fn test_dir_fullpath_from_parent() {
        let root = DirDoc::root();
        let photos = DirDoc::new("d1".to_string(), &root, "Photos").unwrap();
        let trip = DirDoc::new("d2".to_string(), &photos, "Trip").unwrap();

        assert_eq!(photos.fullpath, "/Photos");
        assert_eq!(trip.fullpath, "/Photos/Trip");
        assert_eq!(trip.dir_id, "d1");
    }
}
