use crate::error::Result;
use crate::model::DirDoc;
use crate::paths;
use crate::store::Vfs;

/// Returns the directory at `path`, creating it and any missing ancestor.
///
/// Existing directories are left untouched. A non-directory in the way, or any
/// other storage failure, is returned as is.
pub fn mkdir_all<V: Vfs>(vfs: &mut V, path: &str) -> Result<DirDoc> {
    match vfs.dir_by_path(path) {
        Ok(dir) => return Ok(dir),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let mut parent = vfs.dir_by_path("/")?;
    for segment in paths::segments(path) {
        let next = paths::join(&parent.fullpath, &segment);
        parent = match vfs.dir_by_path(&next) {
            Ok(dir) => dir,
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %next, "Creating directory");
                vfs.create_dir(&parent, &segment)?
            }
            Err(e) => return Err(e),
        };
    }
    Ok(parent)
}
