//! # Rehome Architecture
//!
//! Rehome restores what an export archive holds: the user's file tree, their
//! contacts and their photo albums. It is a library; whatever drives it (a
//! command, a server job) only ever talks to [`api::RehomeApi`].
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Resolves the destination directory                       │
//! │  - Returns an ImportReport, never prints                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - untar routes each archive entry to an importer           │
//! │  - dirs, files, contacts, albums do the actual work         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Vfs + DocStore traits                                    │
//! │  - FsVfs/FsDocStore (production), MemVfs/MemDocStore (tests)│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Archive Layout
//!
//! ```text
//! files/...                 # The tree, restored under the destination
//! albums/albums.json        # One album per line (JSON)
//! albums/references.json    # One {"filepath", "albumid"} per line
//! contacts/<name>.vcf       # One vCard per entry
//! ```
//!
//! Entries are processed strictly in stream order. Album references can only
//! point at albums defined earlier in the same archive.
//!
//! ## Identity
//!
//! Nothing keeps the identifiers it had in the archive. Contacts and albums are
//! normalized (`_id`, `_rev` and the `type` discriminator removed) before being
//! created, so the document store assigns fresh ones. Album references are
//! resolved through a table mapping archive ids to the new ones.
//!
//! ## Logging
//!
//! Everything is reported through `tracing`; the library never installs a
//! subscriber.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for imports
//! - [`commands`]: The import pipeline, one module per importer
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Documents and their JSON shape (`Contact`, `JsonDoc`, `FileDoc`)
//! - [`vcard`]: vCard reader used by the contact importer
//! - [`mime`]: MIME type and class lookup by file name
//! - [`paths`]: Archive and VFS path helpers
//! - [`config`]: Import settings
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod mime;
pub mod model;
pub mod paths;
pub mod store;
pub mod vcard;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
