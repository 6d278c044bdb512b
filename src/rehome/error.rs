use crate::vcard::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RehomeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Gzip or tar framing could not be read.
    #[error("Invalid archive: {0}")]
    Archive(#[source] std::io::Error),

    #[error("Unsupported archive entry {name}: {kind}")]
    UnsupportedEntry { name: String, kind: String },

    #[error("Invalid vCard: {0}")]
    VCard(#[from] ParseError),

    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("Album {0} is defined more than once")]
    DuplicateAlbum(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Content length mismatch for {name}: expected {expected} bytes, got {written}")]
    ContentLengthMismatch {
        name: String,
        expected: u64,
        written: u64,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("{entry}: {source}")]
    Entry {
        entry: String,
        #[source]
        source: Box<RehomeError>,
    },
}

impl RehomeError {
    /// Attaches the name of the archive entry being imported.
    pub fn in_entry(self, entry: impl Into<String>) -> Self {
        RehomeError::Entry {
            entry: entry.into(),
            source: Box::new(self),
        }
    }

    /// The error with every `Entry` context layer removed.
    pub fn root_cause(&self) -> &RehomeError {
        match self {
            RehomeError::Entry { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Sets the line number of an `InvalidRecord`; other errors pass through.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            RehomeError::InvalidRecord { message, .. } => {
                RehomeError::InvalidRecord { line, message }
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), RehomeError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.root_cause(), RehomeError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, RehomeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_entry_layers() {
        let err = RehomeError::NotFound("/a".to_string())
            .in_entry("files/a")
            .in_entry("outer");
        assert!(matches!(err.root_cause(), RehomeError::NotFound(p) if p == "/a"));
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_entry_display_includes_name() {
        let err = RehomeError::Conflict("photo.jpg".to_string()).in_entry("files/photo.jpg");
        assert_eq!(err.to_string(), "files/photo.jpg: Conflict: photo.jpg");
    }
}
