use super::albums::{self, AlbumReferences};
use super::files::{self, FileHeader};
use super::{contacts, dirs, CmdMessage, ImportReport};
use crate::config::ImportConfig;
use crate::error::{RehomeError, Result};
use crate::model::DirDoc;
use crate::paths;
use crate::store::{DocStore, Vfs};
use flate2::read::MultiGzDecoder;
use std::io::Read;
use tar::{Archive, Entry, EntryType};

const FILES: &str = "files";
const ALBUMS: &str = "albums";
const CONTACTS: &str = "contacts";

/// Imports a gzipped tar archive under `dst`, one entry at a time, in stream
/// order.
///
/// Any failure stops the import and is returned with the entry name attached.
/// What was imported before the failure stays in place, and the file store is
/// flushed either way. Concatenated gzip members read as one stream.
pub fn run<R: Read, V: Vfs, D: DocStore>(
    vfs: &mut V,
    docs: &mut D,
    reader: R,
    dst: &DirDoc,
    config: &ImportConfig,
) -> Result<ImportReport> {
    let span = tracing::info_span!("import", destination = %dst.fullpath);
    let _enter = span.enter();

    let imported = import_entries(vfs, docs, reader, dst, config);
    let flushed = vfs.flush().map_err(|e| {
        tracing::error!(error = %e, "Can't flush file metadata");
        e
    });
    let report = imported?;
    flushed?;

    tracing::info!(
        directories = report.directories,
        files = report.files,
        renamed = report.renamed_files,
        contacts = report.contacts,
        albums = report.albums,
        references = report.references_attached,
        skipped_references = report.references_skipped,
        skipped_entries = report.skipped_entries,
        "Import finished"
    );
    Ok(report)
}

fn import_entries<R: Read, V: Vfs, D: DocStore>(
    vfs: &mut V,
    docs: &mut D,
    reader: R,
    dst: &DirDoc,
    config: &ImportConfig,
) -> Result<ImportReport> {
    let mut archive = Archive::new(MultiGzDecoder::new(reader));
    let mut refs = AlbumReferences::new();
    let mut report = ImportReport::default();

    for entry in archive.entries().map_err(RehomeError::Archive)? {
        let mut entry = entry.map_err(|e| {
            tracing::error!(error = %e, "Can't read archive");
            RehomeError::Archive(e)
        })?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

        import_entry(vfs, docs, &mut entry, &name, dst, config, &mut refs, &mut report).map_err(
            |e| {
                tracing::error!(entry = %name, error = %e, "Can't import entry");
                e.in_entry(name.as_str())
            },
        )?;
    }
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn import_entry<R: Read, V: Vfs, D: DocStore>(
    vfs: &mut V,
    docs: &mut D,
    entry: &mut Entry<'_, R>,
    name: &str,
    dst: &DirDoc,
    config: &ImportConfig,
    refs: &mut AlbumReferences,
    report: &mut ImportReport,
) -> Result<()> {
    let (doctype, rel) = paths::split_doctype(name).unwrap_or_default();
    let kind = entry.header().entry_type();

    match kind {
        EntryType::Directory => {
            if doctype == FILES {
                dirs::mkdir_all(vfs, &paths::join(&dst.fullpath, &rel))?;
                report.directories += 1;
            }
        }
        EntryType::Regular | EntryType::Continuous => match doctype.as_str() {
            ALBUMS if rel == config.albums_manifest => {
                tracing::debug!(entry = %name, "Importing albums");
                albums::create_albums(docs, entry, refs, report)?;
            }
            ALBUMS if rel == config.album_references => {
                tracing::debug!(entry = %name, "Attaching album references");
                albums::fill_albums(vfs, entry, dst, refs, report)?;
            }
            CONTACTS => {
                tracing::debug!(entry = %name, "Importing contact");
                contacts::create_contact(docs, entry, report)?;
            }
            FILES => {
                let header = FileHeader {
                    name: rel,
                    size: entry.header().size()?,
                    mode: entry.header().mode()?,
                };
                tracing::debug!(entry = %name, size = header.size, "Importing file");
                files::create_file(vfs, dst, &header, entry, report)?;
            }
            _ => {
                tracing::debug!(entry = %name, "Skipping entry");
                report.skipped_entries += 1;
                report.add_message(CmdMessage::info(format!("Skipped {}", name)));
            }
        },
        other => {
            return Err(RehomeError::UnsupportedEntry {
                name: name.to_string(),
                kind: format!("{:?}", other),
            })
        }
    }
    Ok(())
}
