use super::{dirs, CmdMessage, ImportReport};
use crate::error::{RehomeError, Result};
use crate::model::{DirDoc, FileDoc};
use crate::store::{FileWriter, Vfs};
use crate::{mime, paths};
use chrono::Utc;
use std::io::{self, Read};

/// The parts of a `files/` archive entry header the importer uses.
#[derive(Debug, Clone)]
pub struct FileHeader {
    /// Path relative to the `files/` section, e.g. `Photos/a.jpg`.
    pub name: String,
    /// Declared content length.
    pub size: u64,
    /// POSIX permission bits.
    pub mode: u32,
}

impl FileHeader {
    pub fn is_executable(&self) -> bool {
        self.mode & 0o100 != 0
    }
}

/// `photo.jpg` → `photo-conflict-<random>.jpg`.
pub fn conflict_name(name: &str) -> String {
    let (base, ext) = paths::split_ext(name);
    format!("{}-conflict-{}{}", base, rand::random::<u32>(), ext)
}

/// Recreates one archived file under `dst`.
///
/// A missing parent directory is created rather than treated as an error, since
/// older exports may list a file without its directory entry. If the name is
/// already taken, the file is stored once more under [`conflict_name`]; a
/// second collision is returned as an error.
pub fn create_file<V: Vfs, R: Read>(
    vfs: &mut V,
    dst: &DirDoc,
    header: &FileHeader,
    content: &mut R,
    report: &mut ImportReport,
) -> Result<FileDoc> {
    let (dir_path, filename) = paths::split(&paths::join(&dst.fullpath, &header.name));
    let (mime, class) = mime::from_filename(&filename);

    let dir = match vfs.dir_by_path(&dir_path) {
        Ok(dir) => dir,
        Err(e) if e.is_not_found() => {
            tracing::warn!(path = %dir_path, "Directory missing from archive, creating it");
            dirs::mkdir_all(vfs, &dir_path)?
        }
        Err(e) => return Err(e),
    };

    let mut doc = FileDoc::new(
        &filename,
        &dir.id,
        header.size,
        &mime,
        &class,
        Utc::now(),
        header.is_executable(),
        false,
    )?;

    let mut writer = match vfs.create_file(&doc) {
        Ok(writer) => writer,
        Err(RehomeError::Conflict(_)) => {
            let original = std::mem::replace(&mut doc.name, conflict_name(&filename));
            tracing::warn!(
                path = %paths::join(&dir.fullpath, &original),
                renamed = %doc.name,
                "File already exists, importing under a new name"
            );
            let writer = vfs.create_file(&doc)?;
            report.renamed_files += 1;
            report.add_message(CmdMessage::warning(format!(
                "{} already exists, imported as {}",
                paths::join(&dir.fullpath, &original),
                doc.name
            )));
            writer
        }
        Err(e) => return Err(e),
    };

    // A copy failure wins over a close failure
    let copied = io::copy(content, &mut writer);
    let closed = writer.close();
    copied?;
    let created = closed?;

    report.files += 1;
    Ok(created)
}
