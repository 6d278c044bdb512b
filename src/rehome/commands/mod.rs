//! # Import Pipeline
//!
//! One module per importer, leaves first:
//!
//! - [`dirs`]: makes sure a directory chain exists.
//! - [`files`]: turns a `files/` entry into a stored file.
//! - [`contacts`]: turns a `contacts/` vCard entry into a contact document.
//! - [`albums`]: creates album documents from the manifest, then attaches
//!   photo back-references through the run's [`albums::AlbumReferences`].
//! - [`untar`]: drives one pass over the archive and routes every entry.
//!
//! Importers never print. Anything worth telling the caller (renamed files,
//! skipped references, skipped sections) is returned as a [`CmdMessage`] in the [`ImportReport`]
//! and also emitted through `tracing`.

pub mod albums;
pub mod contacts;
pub mod dirs;
pub mod files;
pub mod untar;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

/// What one import run did.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub directories: usize,
    pub files: usize,
    /// Files stored under a `-conflict-` name.
    pub renamed_files: usize,
    pub contacts: usize,
    pub albums: usize,
    pub references_attached: usize,
    pub references_skipped: usize,
    /// Regular-file entries in sections this importer does not handle.
    pub skipped_entries: usize,
    pub messages: Vec<CmdMessage>,
}

impl ImportReport {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CmdMessage> {
        self.messages
            .iter()
            .filter(|m| m.level == MessageLevel::Warning)
    }
}
