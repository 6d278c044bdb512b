//! Fixtures shared by unit and integration tests.

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{EntryType, Header};

/// Builds an in-memory `.tar.gz` archive shaped like an export.
///
/// ```ignore
/// let archive = ArchiveBuilder::new()
///     .dir("files/Photos")
///     .file("files/Photos/a.jpg", b"jpeg")
///     .finish();
/// ```
pub struct ArchiveBuilder {
    tar: tar::Builder<GzEncoder<Vec<u8>>>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        Self {
            tar: tar::Builder::new(enc),
        }
    }

    pub fn dir(self, path: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        self.append(header, &format!("{}/", path), &[])
    }

    pub fn file(self, path: &str, content: &[u8]) -> Self {
        self.file_with_mode(path, content, 0o644)
    }

    pub fn file_with_mode(self, path: &str, content: &[u8], mode: u32) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(content.len() as u64);
        header.set_mode(mode);
        self.append(header, path, content)
    }

    pub fn symlink(self, path: &str, target: &str) -> Self {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        header
            .set_link_name(target)
            .expect("symlink target fits in header");
        self.append(header, path, &[])
    }

    fn append(mut self, mut header: Header, path: &str, content: &[u8]) -> Self {
        self.tar
            .append_data(&mut header, path, content)
            .expect("append archive entry");
        self
    }

    /// The gzipped archive bytes.
    pub fn finish(self) -> Vec<u8> {
        let enc = self.tar.into_inner().expect("finish tar stream");
        enc.finish().expect("finish gzip stream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tar::Archive;

    #[test]
    fn test_builder_entries() {
        let bytes = ArchiveBuilder::new()
            .dir("files/a")
            .file_with_mode("files/a/run.sh", b"ls", 0o755)
            .symlink("files/link", "a")
            .finish();

        let mut archive = Archive::new(GzDecoder::new(bytes.as_slice()));
        let kinds: Vec<(String, EntryType, u32)> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                let name = String::from_utf8_lossy(&e.path_bytes()).into_owned();
                (name, e.header().entry_type(), e.header().mode().unwrap())
            })
            .collect();

        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[0].1, EntryType::Directory);
        assert_eq!(kinds[1].0, "files/a/run.sh");
        assert_eq!(kinds[1].2, 0o755);
        assert_eq!(kinds[2].1, EntryType::Symlink);
    }
}
