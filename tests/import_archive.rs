use rehome::api::RehomeApi;
use rehome::config::ImportConfig;
use rehome::model::{ALBUMS_DOCTYPE, CONTACTS_DOCTYPE};
use rehome::store::fs::{FsDocStore, FsVfs};
use rehome::store::{DocStore, Vfs};
use rehome::test_utils::ArchiveBuilder;
use std::fs;
use tempfile::TempDir;

struct Env {
    _tmp: TempDir,
    api: RehomeApi<FsVfs, FsDocStore>,
    files_root: std::path::PathBuf,
}

fn env(config: ImportConfig) -> Env {
    let tmp = tempfile::tempdir().unwrap();
    let files_root = tmp.path().join("files");
    let vfs = FsVfs::new(&files_root).unwrap();
    let docs = FsDocStore::new(tmp.path().join("docs")).unwrap();
    Env {
        api: RehomeApi::with_config(vfs, docs, config),
        files_root,
        _tmp: tmp,
    }
}

fn short_names() -> ImportConfig {
    ImportConfig {
        albums_manifest: "manifest".to_string(),
        album_references: "references".to_string(),
    }
}

#[test_log::test]
fn photo_is_attached_to_its_album() {
    let mut env = env(short_names());
    let bytes = ArchiveBuilder::new()
        .file("files/photo.jpg", b"0123456789")
        .file("albums/manifest", b"{\"_id\":\"a1\",\"name\":\"Trip\"}\n")
        .file(
            "albums/references",
            b"{\"filepath\":\"/photo.jpg\",\"albumId\":\"a1\"}\n",
        )
        .finish();

    let report = env.api.import(bytes.as_slice(), "/").unwrap();
    assert_eq!(report.references_skipped, 0);
    assert_eq!(report.references_attached, 1);

    let albums = env.api.docs().all_docs(ALBUMS_DOCTYPE).unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0]["name"], "Trip");

    let photo = env.api.vfs().file_by_path("/photo.jpg").unwrap();
    assert_eq!(photo.size, 10);
    assert_eq!(photo.mime, "image/jpeg");
    assert_eq!(photo.referenced_by.len(), 1);
    assert_eq!(photo.referenced_by[0].id, albums[0]["_id"]);
    assert_eq!(photo.referenced_by[0].doctype, ALBUMS_DOCTYPE);

    assert_eq!(
        fs::read(env.files_root.join("photo.jpg")).unwrap(),
        b"0123456789"
    );
}

#[test_log::test]
fn reference_to_missing_photo_is_tolerated() {
    let mut env = env(short_names());
    let bytes = ArchiveBuilder::new()
        .file("albums/manifest", b"{\"_id\":\"a1\",\"name\":\"Trip\"}\n")
        .file(
            "albums/references",
            b"{\"filepath\":\"/missing.jpg\",\"albumId\":\"a1\"}\n",
        )
        .finish();

    let report = env.api.import(bytes.as_slice(), "/").unwrap();

    assert_eq!(report.references_attached, 0);
    assert_eq!(report.references_skipped, 1);
    assert!(env
        .api
        .vfs()
        .file_by_path("/missing.jpg")
        .unwrap_err()
        .is_not_found());
}

#[test_log::test]
fn tree_is_restored_under_destination() {
    let mut env = env(ImportConfig::default());
    let bytes = ArchiveBuilder::new()
        .dir("files/Documents")
        .dir("files/Documents/Empty")
        .file("files/Documents/cv.pdf", b"%PDF")
        // Directory entry never emitted for Photos/2017
        .file("files/Photos/2017/beach.png", b"png")
        .file_with_mode("files/bin/run.sh", b"#!/bin/sh\n", 0o755)
        .finish();

    let report = env.api.import(bytes.as_slice(), "/Restored").unwrap();
    assert_eq!(report.files, 3);

    let vfs = env.api.vfs();
    for dir in ["/Restored/Documents/Empty", "/Restored/Photos/2017"] {
        assert!(vfs.dir_by_path(dir).is_ok(), "{}", dir);
    }
    let cv = vfs.file_by_path("/Restored/Documents/cv.pdf").unwrap();
    assert_eq!(cv.class, "pdf");
    assert!(vfs.file_by_path("/Restored/bin/run.sh").unwrap().executable);

    assert!(env.files_root.join("Restored/Photos/2017/beach.png").is_file());
}

#[cfg(unix)]
#[test]
fn executable_bit_reaches_disk() {
    use std::os::unix::fs::PermissionsExt;

    let mut env = env(ImportConfig::default());
    let bytes = ArchiveBuilder::new()
        .file_with_mode("files/run.sh", b"ls\n", 0o755)
        .finish();
    env.api.import(bytes.as_slice(), "/").unwrap();

    let mode = fs::metadata(env.files_root.join("run.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_ne!(mode & 0o100, 0);
}

#[test_log::test]
fn existing_file_is_kept_and_import_renamed() {
    let mut env = env(ImportConfig::default());
    fs::create_dir_all(env.files_root.join("Restored")).unwrap();
    fs::write(env.files_root.join("Restored/notes.txt"), b"mine").unwrap();

    let bytes = ArchiveBuilder::new().file("files/notes.txt", b"theirs").finish();
    let report = env.api.import(bytes.as_slice(), "/Restored").unwrap();

    assert_eq!(report.renamed_files, 1);
    assert_eq!(
        fs::read(env.files_root.join("Restored/notes.txt")).unwrap(),
        b"mine"
    );

    let renamed: Vec<String> = fs::read_dir(env.files_root.join("Restored"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n != "notes.txt")
        .collect();
    assert_eq!(renamed.len(), 1);
    let digits = renamed[0]
        .strip_prefix("notes-conflict-")
        .and_then(|rest| rest.strip_suffix(".txt"))
        .unwrap();
    assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(
        fs::read(env.files_root.join("Restored").join(&renamed[0])).unwrap(),
        b"theirs"
    );
}

#[test_log::test]
fn contacts_are_stored_with_fresh_ids() {
    let mut env = env(ImportConfig::default());
    let bytes = ArchiveBuilder::new()
        .file(
            "contacts/ada.vcf",
            b"BEGIN:VCARD\r\nVERSION:3.0\r\nN:Lovelace;Ada;;;\r\nFN:Ada Lovelace\r\nEMAIL:ada@example.com\r\nEND:VCARD\r\n",
        )
        .file(
            "contacts/nameless.vcf",
            b"BEGIN:VCARD\r\nVERSION:3.0\r\nTEL:555\r\nEND:VCARD\r\n",
        )
        .finish();

    let report = env.api.import(bytes.as_slice(), "/").unwrap();
    assert_eq!(report.contacts, 2);

    let contacts = env.api.docs().all_docs(CONTACTS_DOCTYPE).unwrap();
    let mut names: Vec<&str> = contacts
        .iter()
        .map(|c| c["fullname"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Ada Lovelace", "John Doe"]);
    for contact in &contacts {
        assert!(contact["_rev"].as_str().unwrap().starts_with("1-"));
    }
}

#[test_log::test]
fn failure_names_the_entry_and_keeps_earlier_work() {
    let mut env = env(ImportConfig::default());
    let bytes = ArchiveBuilder::new()
        .file("files/a.txt", b"a")
        .file("albums/albums.json", b"not json\n")
        .file("files/b.txt", b"b")
        .finish();

    let err = env.api.import(bytes.as_slice(), "/").unwrap_err();

    assert!(err.to_string().starts_with("albums/albums.json: "));
    assert!(env.files_root.join("a.txt").is_file());
    assert!(!env.files_root.join("b.txt").exists());

    // File metadata is on disk even though the run failed
    let index = fs::read_to_string(env.files_root.join(".rehome/index.json")).unwrap();
    assert!(index.contains("\"/a.txt\""));
}

#[test_log::test]
fn identities_survive_reopening_the_store() {
    let mut env = env(ImportConfig::default());
    let bytes = ArchiveBuilder::new()
        .dir("files/Photos")
        .file("files/Photos/a.jpg", b"jpeg")
        .finish();
    env.api.import(bytes.as_slice(), "/").unwrap();
    let before = env.api.vfs().file_by_path("/Photos/a.jpg").unwrap();

    let reopened = FsVfs::new(&env.files_root).unwrap();
    let after = reopened.file_by_path("/Photos/a.jpg").unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.dir_id, before.dir_id);
}

#[test]
fn import_from_path() {
    let mut env = env(ImportConfig::default());
    let tmp = tempfile::tempdir().unwrap();
    let archive_path = tmp.path().join("export.tar.gz");
    fs::write(
        &archive_path,
        ArchiveBuilder::new().file("files/a.txt", b"a").finish(),
    )
    .unwrap();

    let report = env.api.import_path(&archive_path, "/").unwrap();
    assert_eq!(report.files, 1);
}
