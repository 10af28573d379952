/*!
 * Packed Archive Tests
 * Archives produced by the tar crate, fused executables and corruption
 */

use std::fs;
use std::path::{Path, PathBuf};

use mountfs::vfs::{Archive, FileType, PackedArchive, VfsError};
use mountfs::{fuse, FilesystemConfig, Filesystem, StaticEnvironment};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

enum Fixture<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

/// Build an archive with the tar crate as an independent writer
fn tar_bytes(entries: &[Fixture], gnu: bool) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for entry in entries {
        let mut header = if gnu {
            tar::Header::new_gnu()
        } else {
            tar::Header::new_ustar()
        };
        header.set_mtime(1_700_000_000);
        match entry {
            Fixture::File(name, data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, name, *data).unwrap();
            }
            Fixture::Dir(name) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, name, &[][..]).unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn filesystem() -> Filesystem {
    Filesystem::new(FilesystemConfig::default(), StaticEnvironment::new())
}

fn sample() -> Vec<u8> {
    tar_bytes(
        &[
            Fixture::File("x.txt", b"hello"),
            Fixture::Dir("dir/"),
            Fixture::File("dir/y.txt", b"world"),
        ],
        false,
    )
}

#[test]
fn test_round_trip_through_facade() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "game.tar", &sample());

    let mut fs = filesystem();
    fs.mount(&path, true).unwrap();

    assert_eq!(fs.read("x.txt").unwrap(), b"hello");
    assert_eq!(fs.read("dir/y.txt").unwrap(), b"world");
    assert!(fs.is_directory("dir"));
    assert!(fs.is_file("dir/y.txt"));
    assert!(!fs.exists("missing.txt"));
    assert_eq!(fs.last_modified("x.txt"), 1_700_000_000);
    assert_eq!(fs.real_directory("dir/y.txt"), Some(path.as_path()));
    assert_eq!(fs.directory_items(""), vec!["dir", "x.txt"]);
    assert_eq!(fs.directory_items("dir"), vec!["y.txt"]);
}

#[test]
fn test_gnu_long_names() {
    let long = format!("{}/{}.txt", "d".repeat(90), "f".repeat(80));
    let bytes = tar_bytes(&[Fixture::File(&long, b"deep")], true);

    let temp = TempDir::new().unwrap();
    let archive = PackedArchive::open(write_file(temp.path(), "long.tar", &bytes)).unwrap();
    assert_eq!(archive.index().len(), 1);
    assert_eq!(archive.read(&long).unwrap(), b"deep");
}

#[test]
fn test_ustar_prefix_names() {
    let long = format!("{}/{}/leaf.txt", "a".repeat(60), "b".repeat(60));
    let bytes = tar_bytes(&[Fixture::File(&long, b"leaf")], false);

    let temp = TempDir::new().unwrap();
    let archive = PackedArchive::open(write_file(temp.path(), "prefix.tar", &bytes)).unwrap();
    assert!(archive.is_file(&long));
    assert_eq!(archive.read(&long).unwrap(), b"leaf");
}

#[test]
fn test_metadata_types() {
    let temp = TempDir::new().unwrap();
    let archive = PackedArchive::open(write_file(temp.path(), "game.tar", &sample())).unwrap();

    let dir = archive.metadata("dir").unwrap();
    assert_eq!(dir.file_type, FileType::Directory);
    let file = archive.metadata("dir/y.txt").unwrap();
    assert_eq!((file.file_type, file.size, file.modified), (FileType::File, 5, 1_700_000_000));
}

#[test]
fn test_fused_both_trailer_conventions() {
    let temp = TempDir::new().unwrap();
    let body = sample();
    let image = vec![0x90u8; 777];

    for offset in [body.len() as u32 + 8, body.len() as u32] {
        let mut bytes = image.clone();
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(b"TAR\0");
        bytes.extend_from_slice(&offset.to_le_bytes());
        let path = write_file(temp.path(), &format!("fused-{}", offset), &bytes);

        let archive = PackedArchive::open(&path).unwrap();
        assert_eq!(archive.base_offset(), 777);
        assert_eq!(archive.read("dir/y.txt").unwrap(), b"world");
        assert_eq!(archive.index().len(), 3);
    }
}

#[test]
fn test_fuse_helper_mounts_like_plain_archive() {
    let temp = TempDir::new().unwrap();
    let exe = write_file(temp.path(), "runner", b"#!/bin/sh\nexit 0\n");
    let tar = write_file(temp.path(), "game.tar", &sample());
    let fused = temp.path().join("game");
    fuse(&exe, &tar, &fused).unwrap();

    let plain = PackedArchive::open(&tar).unwrap();
    let joined = PackedArchive::open(&fused).unwrap();
    let mut plain_names: Vec<_> = plain.index().names().collect();
    let mut joined_names: Vec<_> = joined.index().names().collect();
    plain_names.sort_unstable();
    joined_names.sort_unstable();
    assert_eq!(plain_names, joined_names);
    assert_eq!(joined.read("x.txt").unwrap(), b"hello");
}

#[test]
fn test_fused_executable_becomes_source() {
    let temp = TempDir::new().unwrap();
    let exe = write_file(temp.path(), "runner", b"\x7fELF....");
    let tar = write_file(temp.path(), "game.tar", &sample());
    let fused = temp.path().join("game");
    fuse(&exe, &tar, &fused).unwrap();

    let mut fs = Filesystem::new(
        FilesystemConfig::default(),
        StaticEnvironment::new().with_executable(&fused),
    );
    fs.init(Some(temp.path()));

    assert!(fs.is_fused());
    assert_eq!(fs.source(), Some(fused.as_path()));
    assert_eq!(fs.mounts().len(), 1);
    assert_eq!(fs.read("x.txt").unwrap(), b"hello");
}

#[test]
fn test_corrupt_archives_fail_to_mount() {
    let temp = TempDir::new().unwrap();

    let mut first = sample();
    first[0] ^= 0x55;
    let path = write_file(temp.path(), "bad-first.tar", &first);
    assert!(matches!(
        filesystem().mount(&path, true),
        Err(VfsError::MountFailed(_))
    ));

    let mut second = sample();
    second[1024 + 10] ^= 0x55;
    let path = write_file(temp.path(), "bad-second.tar", &second);
    assert!(PackedArchive::open(&path).is_err());
    assert!(matches!(
        filesystem().mount(&path, true),
        Err(VfsError::MountFailed(_))
    ));
}

/// Valid archive followed by one GNU header declaring `size` data bytes
fn with_oversized_entry(kind: tar::EntryType, size: u64) -> Vec<u8> {
    let mut bytes = sample();
    let end = bytes.len() - 1024;
    bytes.truncate(end);

    let mut header = tar::Header::new_gnu();
    header.set_path("oversized").unwrap();
    header.set_entry_type(kind);
    header.set_size(size);
    header.set_cksum();
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(&[0u8; 1024]);
    bytes
}

#[test]
fn test_oversized_entries_fail_to_mount() {
    let temp = TempDir::new().unwrap();
    let cases = [
        ("max-size.tar", tar::EntryType::Regular, u64::MAX),
        ("half-max.tar", tar::EntryType::Regular, 1 << 63),
        ("past-end.tar", tar::EntryType::Regular, 4096),
        ("long-name.tar", tar::EntryType::GNULongName, 1 << 40),
    ];

    for (name, kind, size) in cases {
        let path = write_file(temp.path(), name, &with_oversized_entry(kind, size));
        assert!(
            matches!(PackedArchive::open(&path), Err(VfsError::InvalidArchive(_))),
            "{} should be rejected",
            name
        );
        assert!(matches!(
            filesystem().mount(&path, true),
            Err(VfsError::MountFailed(_))
        ));
    }
}

#[test]
fn test_empty_archive_is_not_recognized() {
    let temp = TempDir::new().unwrap();
    let empty = tar::Builder::new(Vec::new()).into_inner().unwrap();
    let path = write_file(temp.path(), "empty.tar", &empty);
    assert!(filesystem().mount(&path, true).is_err());
}
