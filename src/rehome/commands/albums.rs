use super::{CmdMessage, ImportReport};
use crate::error::{RehomeError, Result};
use crate::model::{DirDoc, Doc, DocReference, JsonDoc, ALBUMS_DOCTYPE};
use crate::paths;
use crate::store::{DocStore, Vfs};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};

/// Archive-local album id → reference to the album created for it.
///
/// Filled by [`create_albums`] and only read by [`fill_albums`]; lives for one
/// import run.
pub type AlbumReferences = HashMap<String, DocReference>;

/// One line of the references entry.
#[derive(Debug, Deserialize)]
struct Reference {
    filepath: String,
    #[serde(alias = "albumId")]
    albumid: String,
}

// Non-blank lines with their 1-based line numbers
fn records<R: Read>(content: R) -> impl Iterator<Item = Result<(usize, String)>> {
    BufReader::new(content)
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(Ok((idx + 1, line))),
            Err(e) => Some(Err(RehomeError::from(e))),
        })
}

fn invalid(line: usize, err: serde_json::Error) -> RehomeError {
    RehomeError::InvalidRecord {
        line,
        message: err.to_string(),
    }
}

/// Creates one album document per manifest line and records its new identity
/// in `refs`.
pub fn create_albums<D: DocStore, R: Read>(
    docs: &mut D,
    content: R,
    refs: &mut AlbumReferences,
    report: &mut ImportReport,
) -> Result<()> {
    for record in records(content) {
        let (line, raw) = record?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| invalid(line, e))?;
        let (local_id, mut album) =
            JsonDoc::from_archive_record(ALBUMS_DOCTYPE, value).map_err(|e| e.at_line(line))?;

        if let Some(local_id) = &local_id {
            if refs.contains_key(local_id) {
                return Err(RehomeError::DuplicateAlbum(local_id.clone()));
            }
        }

        docs.create_doc(&mut album)?;
        let id = album
            .id()
            .map(str::to_string)
            .ok_or_else(|| RehomeError::Store("Album created without id".to_string()))?;
        report.albums += 1;

        match local_id {
            Some(local_id) => {
                tracing::debug!(local_id = %local_id, id = %id, "Album created");
                refs.insert(local_id, DocReference::new(id, ALBUMS_DOCTYPE));
            }
            None => {
                tracing::warn!(line, id = %id, "Album has no _id, it cannot be referenced");
                report.add_message(CmdMessage::warning(format!(
                    "album on line {} has no _id and cannot receive photos",
                    line
                )));
            }
        }
    }
    Ok(())
}

/// Attaches album back-references to the files named in the references entry.
///
/// A record whose file is missing, or whose album was never defined, is
/// skipped with a warning. Albums themselves are never touched.
pub fn fill_albums<V: Vfs, R: Read>(
    vfs: &mut V,
    content: R,
    dst: &DirDoc,
    refs: &AlbumReferences,
    report: &mut ImportReport,
) -> Result<()> {
    for record in records(content) {
        let (line, raw) = record?;
        let reference: Reference = serde_json::from_str(&raw).map_err(|e| invalid(line, e))?;
        let path = paths::join(&dst.fullpath, &reference.filepath);

        let mut file = match vfs.file_by_path(&path) {
            Ok(file) => file,
            Err(e) if e.is_not_found() => {
                tracing::warn!(path = %path, "Referenced file not found, skipping");
                skip(report, format!("{} is not in the archive", path));
                continue;
            }
            Err(e) => return Err(e),
        };

        let Some(album) = refs.get(&reference.albumid) else {
            tracing::warn!(album = %reference.albumid, path = %path, "Unknown album, skipping");
            skip(
                report,
                format!("album {} referenced by {} is unknown", reference.albumid, path),
            );
            continue;
        };

        if !file.add_referenced_by(album.clone()) {
            tracing::debug!(path = %path, album = %album.id, "Reference already attached");
            continue;
        }
        vfs.update_file(&file)?;
        report.references_attached += 1;
    }
    Ok(())
}

fn skip(report: &mut ImportReport, message: String) {
    report.references_skipped += 1;
    report.add_message(CmdMessage::warning(message));
}
