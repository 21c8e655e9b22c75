//! Hostile archives must never write outside the extraction directory

use stash_core::{extract_as, Error, Format, ReadOptions};
use stash_testing::TestDir;
use std::fs::File;
use std::io::Write;

#[test]
fn zip_with_parent_traversal_is_rejected() {
    let dir = TestDir::new();
    let archive = dir.path().join("evil.zip");
    let file = File::create(&archive).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("../escape.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"pwned").unwrap();
    writer.finish().unwrap();

    let out = dir.path().join("out");
    let err = extract_as(&archive, &out, Format::Zip, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PathTraversal(_)));
    assert!(!dir.path().join("escape.txt").exists());
}

#[test]
fn zip_with_absolute_paths_is_rejected() {
    let dir = TestDir::new();
    let archive = dir.path().join("evil.zip");
    let file = File::create(&archive).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("/tmp/escape.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"pwned").unwrap();
    writer.finish().unwrap();

    let err = extract_as(
        &archive,
        &dir.path().join("out"),
        Format::Zip,
        &ReadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::PathTraversal(_)));
}

#[test]
fn tar_with_parent_traversal_is_rejected() {
    let dir = TestDir::new();
    let archive = dir.path().join("evil.tar");
    let file = File::create(&archive).unwrap();
    let mut builder = tar::Builder::new(file);

    // Write the name bytes directly; set_path would refuse them.
    let mut header = tar::Header::new_gnu();
    let name = b"../escape.txt";
    header.as_old_mut().name[..name.len()].copy_from_slice(name);
    header.set_size(5);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, &b"pwned"[..]).unwrap();
    builder.finish().unwrap();

    let out = dir.path().join("out");
    let err = extract_as(&archive, &out, Format::Tar, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PathTraversal(_)));
    assert!(!dir.path().join("escape.txt").exists());
}

#[cfg(feature = "sevenz")]
#[test]
fn sevenz_with_parent_traversal_is_rejected() {
    let dir = TestDir::new();
    let archive = dir.path().join("evil.7z");
    let mut writer = sevenz_rust::SevenZWriter::create(&archive).unwrap();
    let mut entry = sevenz_rust::SevenZArchiveEntry::default();
    entry.name = "../escape.txt".to_string();
    entry.has_stream = true;
    writer
        .push_archive_entry(entry, Some(&b"pwned"[..]))
        .unwrap();
    writer.finish().unwrap();

    let out = dir.path().join("out");
    let err = extract_as(&archive, &out, Format::SevenZ, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PathTraversal(_)));
    assert!(!dir.path().join("escape.txt").exists());
}

#[test]
fn clean_entries_before_a_hostile_one_do_not_leak_outside() {
    let dir = TestDir::new();
    let archive = dir.path().join("mixed.zip");
    let file = File::create(&archive).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("fine.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"fine").unwrap();
    writer
        .start_file("../escape.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"pwned").unwrap();
    writer.finish().unwrap();

    let out = dir.path().join("out");
    let err = extract_as(&archive, &out, Format::Zip, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::PathTraversal(_)));
    // The clean entry may exist, but nothing may land above the target.
    assert!(!dir.path().join("escape.txt").exists());
}
