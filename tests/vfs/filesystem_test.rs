/*!
 * Filesystem Facade Tests
 * Mount precedence, save directory writes and identity handling
 */

use std::fs;
use std::path::Path;

use mountfs::{Filesystem, FilesystemConfig, StaticEnvironment, VfsError};
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

fn filesystem(app_data: &Path) -> Filesystem {
    Filesystem::new(
        FilesystemConfig::default(),
        StaticEnvironment::new().with_app_data(app_data),
    )
}

fn dir_with(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, body) in files {
        let path = temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }
    temp
}

#[test]
fn test_double_mount_then_remount() {
    let data = dir_with(&[("a.txt", "a")]);
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());

    fs.mount(data.path(), true).unwrap();
    assert!(matches!(
        fs.mount(data.path(), true),
        Err(VfsError::AlreadyMounted(_))
    ));

    assert!(fs.unmount(data.path()));
    assert!(!fs.exists("a.txt"));
    fs.mount(data.path(), true).unwrap();
    assert!(fs.exists("a.txt"));
}

#[test]
fn test_front_mount_shadows_back_mount() {
    let m1 = dir_with(&[("a.txt", "from m1")]);
    let m2 = dir_with(&[("a.txt", "from m2"), ("only2.txt", "2")]);
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());

    fs.mount(m2.path(), true).unwrap();
    fs.mount(m1.path(), false).unwrap();

    assert_eq!(fs.read("a.txt").unwrap(), b"from m1");
    assert_eq!(fs.real_directory("a.txt"), Some(m1.path()));
    assert_eq!(fs.real_directory("only2.txt"), Some(m2.path()));

    assert!(fs.unmount(m1.path()));
    assert_eq!(fs.read("a.txt").unwrap(), b"from m2");
}

#[test]
fn test_directory_items_aggregate_without_dedup() {
    let m1 = dir_with(&[("shared.txt", ""), ("one.txt", "")]);
    let m2 = dir_with(&[("shared.txt", ""), ("two.txt", "")]);
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    fs.mount(m1.path(), true).unwrap();
    fs.mount(m2.path(), true).unwrap();

    assert_eq!(
        fs.directory_items(""),
        vec!["one.txt", "shared.txt", "shared.txt", "two.txt"]
    );

    let mut count = 0;
    fs.for_each_item("", |_| count += 1);
    assert_eq!(count, 4);
}

#[test]
fn test_missing_paths() {
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    let data = dir_with(&[("a.txt", "a")]);
    fs.mount(data.path(), true).unwrap();

    assert!(fs.size("nope").unwrap_err().is_not_found());
    assert_eq!(fs.last_modified("nope"), 0);
    assert!(fs.read("nope").unwrap_err().is_not_found());
    assert!(fs.real_directory("nope").is_none());
    assert!(!fs.unmount("/not/mounted"));
}

#[test]
fn test_unrecognized_source_is_mount_failed() {
    let data = dir_with(&[("notes.txt", "plain text, not an archive")]);
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    assert!(matches!(
        fs.mount(data.path().join("notes.txt"), true),
        Err(VfsError::MountFailed(_))
    ));
}

#[test]
fn test_save_directory_round_trip() {
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    fs.set_identity("game1").unwrap();

    let save = fs.save_directory().unwrap().to_path_buf();
    assert!(save.ends_with("mountfs/game1"));
    assert!(save.is_dir());
    assert_eq!(fs.identity(), Some("game1"));

    assert_eq!(fs.write("scores.txt", b"10", false).unwrap(), 2);
    assert_eq!(fs.append("scores.txt", b",20").unwrap(), 3);
    assert_eq!(fs.read("scores.txt").unwrap(), b"10,20");
    assert_eq!(fs::read(save.join("scores.txt")).unwrap(), b"10,20");

    fs.write("scores.txt", b"0", false).unwrap();
    assert_eq!(fs.read("scores.txt").unwrap(), b"0");

    fs.remove("scores.txt").unwrap();
    assert!(!fs.exists("scores.txt"));
}

#[test]
fn test_create_directory_and_remove() {
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    fs.set_identity("game").unwrap();

    assert!(fs.write("saves/slot1.dat", b"x", false).is_err());
    fs.create_directory("saves/deep/er").unwrap();
    assert!(fs.is_directory("saves/deep/er"));
    fs.write("saves/slot1.dat", b"x", false).unwrap();

    assert!(fs.remove("saves").is_err());
    fs.remove("saves/deep/er").unwrap();
    assert!(!fs.exists("saves/deep/er"));
    assert!(fs.remove("saves/missing").unwrap_err().is_not_found());
}

#[test]
fn test_save_directory_shadows_source() {
    let source = dir_with(&[("config.txt", "default")]);
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    fs.init(Some(source.path()));
    assert!(!fs.is_fused());
    assert!(fs.source().is_some());

    fs.set_identity("game").unwrap();
    fs.write("config.txt", b"custom", false).unwrap();
    assert_eq!(fs.read("config.txt").unwrap(), b"custom");

    let save = fs.save_directory().unwrap().to_path_buf();
    assert_eq!(fs.mounts()[0].path, save);

    fs.remove("config.txt").unwrap();
    assert_eq!(fs.read("config.txt").unwrap(), b"default");
}

#[test]
fn test_init_without_source_starts_empty() {
    let app = TempDir::new().unwrap();
    let mut fs = filesystem(app.path());
    fs.init(Some(app.path().join("does-not-exist").as_path()));
    assert!(fs.source().is_none());
    assert!(fs.mounts().is_empty());

    fs.init(None);
    assert!(fs.mounts().is_empty());
}

#[test]
#[serial]
fn test_env_namespace_override() {
    std::env::set_var("MOUNTFS_NAMESPACE", "Studio");
    let app = TempDir::new().unwrap();
    std::env::set_var("MOUNTFS_APPDATA_DIR", app.path());

    let mut fs = Filesystem::new(FilesystemConfig::from_env(), StaticEnvironment::new());
    let result = fs.set_identity("title");

    std::env::remove_var("MOUNTFS_NAMESPACE");
    std::env::remove_var("MOUNTFS_APPDATA_DIR");

    result.unwrap();
    let save = fs.save_directory().unwrap();
    assert!(save.starts_with(app.path()));
    assert!(save.ends_with("Studio/title"));
}
