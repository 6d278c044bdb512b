//! # API Facade
//!
//! The single entry point for importing an archive. It owns the two storage
//! collaborators and the import settings, resolves the destination directory,
//! then hands the stream to [`commands::untar`].
//!
//! ## Generic Over Storage
//!
//! `RehomeApi<V: Vfs, D: DocStore>` runs unchanged against:
//! - Production: `RehomeApi<FsVfs, FsDocStore>`
//! - Testing: `RehomeApi<MemVfs, MemDocStore>`
//!
//! Like the commands beneath it, the facade never prints. Callers get an
//! [`ImportReport`] and decide how to present it.

use crate::commands::{self, ImportReport};
use crate::config::ImportConfig;
use crate::error::Result;
use crate::store::{DocStore, Vfs};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct RehomeApi<V: Vfs, D: DocStore> {
    vfs: V,
    docs: D,
    config: ImportConfig,
}

impl<V: Vfs, D: DocStore> RehomeApi<V, D> {
    pub fn new(vfs: V, docs: D) -> Self {
        Self::with_config(vfs, docs, ImportConfig::default())
    }

    pub fn with_config(vfs: V, docs: D, config: ImportConfig) -> Self {
        Self { vfs, docs, config }
    }

    /// Reads the settings from `config_dir/config.json`, falling back to the
    /// defaults when the file does not exist.
    pub fn with_config_dir<P: AsRef<Path>>(vfs: V, docs: D, config_dir: P) -> Result<Self> {
        let config = ImportConfig::load(config_dir.as_ref())?;
        tracing::debug!(
            config_dir = %config_dir.as_ref().display(),
            albums_manifest = %config.albums_manifest,
            album_references = %config.album_references,
            "Loaded import settings"
        );
        Ok(Self::with_config(vfs, docs, config))
    }

    /// Writes the active settings to `config_dir/config.json`.
    pub fn save_config<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        self.config.save(config_dir)
    }

    /// Imports a `.tar.gz` stream under `destination`, which is created
    /// (ancestors included) if it does not exist yet.
    pub fn import<R: Read>(&mut self, reader: R, destination: &str) -> Result<ImportReport> {
        let dst = commands::dirs::mkdir_all(&mut self.vfs, destination).map_err(|e| {
            tracing::error!(destination, error = %e, "Can't resolve destination directory");
            e
        })?;
        commands::untar::run(&mut self.vfs, &mut self.docs, reader, &dst, &self.config)
    }

    /// Same as [`import`](Self::import), reading the archive from a file.
    pub fn import_path<P: AsRef<Path>>(
        &mut self,
        path: P,
        destination: &str,
    ) -> Result<ImportReport> {
        let file = File::open(path.as_ref())?;
        self.import(BufReader::new(file), destination)
    }

    pub fn vfs(&self) -> &V {
        &self.vfs
    }

    pub fn docs(&self) -> &D {
        &self.docs
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }
}
