/*!
 * Directory Archive Tests
 * Host directory pass-through behavior
 */

use std::fs;

use mountfs::vfs::{Archive, DirectoryArchive, FileType};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::TempDir;

#[test]
fn test_reads_match_host_bytes() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("assets/img")).unwrap();
    let binary: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
    fs::write(temp.path().join("assets/img/pixels.bin"), &binary).unwrap();

    let archive = DirectoryArchive::open(temp.path()).unwrap();
    assert_eq!(archive.read("assets/img/pixels.bin").unwrap(), binary);
    assert_eq!(archive.size("assets/img/pixels.bin").unwrap(), 3000);
    assert!(archive.last_modified("assets/img/pixels.bin") > 0);
}

#[test]
fn test_classification() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("dir")).unwrap();
    fs::write(temp.path().join("file.txt"), "x").unwrap();
    let archive = DirectoryArchive::open(temp.path()).unwrap();

    assert!(archive.is_directory("dir"));
    assert!(!archive.is_file("dir"));
    assert!(archive.is_file("file.txt"));
    assert!(!archive.is_directory("file.txt"));
    assert!(!archive.exists("nothing"));
    assert!(!archive.is_file("nothing"));

    let md = archive.metadata("dir").unwrap();
    assert_eq!(md.file_type, FileType::Directory);
}

#[test]
fn test_missing_paths_report_not_found() {
    let temp = TempDir::new().unwrap();
    let archive = DirectoryArchive::open(temp.path()).unwrap();

    assert!(archive.size("missing").unwrap_err().is_not_found());
    assert!(archive.read("missing").unwrap_err().is_not_found());
    assert_eq!(archive.last_modified("missing"), 0);

    let mut seen = Vec::new();
    archive.for_each_entry("missing", &mut |name| seen.push(name.to_string()));
    assert!(seen.is_empty());
}

#[test]
fn test_enumeration_is_sorted_and_shallow() {
    let temp = TempDir::new().unwrap();
    for name in ["zeta.txt", "alpha.txt", "mid"] {
        if name.ends_with(".txt") {
            fs::write(temp.path().join(name), "").unwrap();
        } else {
            fs::create_dir(temp.path().join(name)).unwrap();
            fs::write(temp.path().join(name).join("inner.txt"), "").unwrap();
        }
    }
    let archive = DirectoryArchive::open(temp.path()).unwrap();

    let mut seen = Vec::new();
    archive.for_each_entry("", &mut |name| seen.push(name.to_string()));
    assert_eq!(seen, vec!["alpha.txt", "mid", "zeta.txt"]);
}

proptest! {
    #[test]
    fn prop_read_matches_host(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blob"), &data).unwrap();
        let archive = DirectoryArchive::open(temp.path()).unwrap();
        prop_assert_eq!(archive.read("blob").unwrap(), data);
    }
}
