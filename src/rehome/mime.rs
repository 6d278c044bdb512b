//! Filename → (MIME type, class) lookup.
//!
//! The class is a coarse bucket used by file listings (`image`, `audio`,
//! `video`, `text`, `pdf`, ...). Unknown extensions fall back to
//! `application/octet-stream` / `files`.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_MIME: &str = "application/octet-stream";
pub const DEFAULT_CLASS: &str = "files";

static TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (".jpg", "image/jpeg"),
        (".jpeg", "image/jpeg"),
        (".png", "image/png"),
        (".gif", "image/gif"),
        (".bmp", "image/bmp"),
        (".webp", "image/webp"),
        (".heic", "image/heic"),
        (".svg", "image/svg+xml"),
        (".tif", "image/tiff"),
        (".tiff", "image/tiff"),
        (".mp3", "audio/mpeg"),
        (".ogg", "audio/ogg"),
        (".flac", "audio/flac"),
        (".wav", "audio/wav"),
        (".m4a", "audio/mp4"),
        (".mp4", "video/mp4"),
        (".mov", "video/quicktime"),
        (".avi", "video/x-msvideo"),
        (".mkv", "video/x-matroska"),
        (".webm", "video/webm"),
        (".txt", "text/plain"),
        (".md", "text/markdown"),
        (".csv", "text/csv"),
        (".html", "text/html"),
        (".htm", "text/html"),
        (".css", "text/css"),
        (".vcf", "text/vcard"),
        (".ics", "text/calendar"),
        (".json", "application/json"),
        (".xml", "application/xml"),
        (".js", "application/javascript"),
        (".pdf", "application/pdf"),
        (".zip", "application/zip"),
        (".gz", "application/gzip"),
        (".tar", "application/x-tar"),
        (".odt", "application/vnd.oasis.opendocument.text"),
        (".ods", "application/vnd.oasis.opendocument.spreadsheet"),
        (".odp", "application/vnd.oasis.opendocument.presentation"),
        (
            ".docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        (
            ".xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        (
            ".pptx",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ),
    ])
});

/// Derives the MIME type and class of a file from its name.
pub fn from_filename(name: &str) -> (String, String) {
    let (_, ext) = crate::paths::split_ext(name);
    let mime = TYPES
        .get(ext.to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_MIME);
    (mime.to_string(), class_of(mime).to_string())
}

fn class_of(mime: &str) -> &'static str {
    let (top, sub) = mime.split_once('/').unwrap_or((mime, ""));
    match (top, sub) {
        ("image", _) => "image",
        ("audio", _) => "audio",
        ("video", _) => "video",
        ("text", _) => "text",
        ("application", "pdf") => "pdf",
        ("application", "zip" | "gzip" | "x-tar") => "zip",
        ("application", s) if s.contains("opendocument") || s.contains("officedocument") => {
            if s.contains("spreadsheet") {
                "spreadsheet"
            } else if s.contains("presentation") {
                "slide"
            } else {
                "text"
            }
        }
        _ => DEFAULT_CLASS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(
            from_filename("photo.JPG"),
            ("image/jpeg".to_string(), "image".to_string())
        );
        assert_eq!(
            from_filename("report.pdf"),
            ("application/pdf".to_string(), "pdf".to_string())
        );
        assert_eq!(
            from_filename("budget.ods"),
            (
                "application/vnd.oasis.opendocument.spreadsheet".to_string(),
                "spreadsheet".to_string()
            )
        );
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        assert_eq!(
            from_filename("data.xyz"),
            (DEFAULT_MIME.to_string(), DEFAULT_CLASS.to_string())
        );
        assert_eq!(
            from_filename("Makefile"),
            (DEFAULT_MIME.to_string(), DEFAULT_CLASS.to_string())
        );
    }
}
