//! Test fixtures and helpers

#![allow(dead_code)]

use std::sync::Arc;

use bifrost::{Bifrost, ConfigSources, Context, EventLog, Platform, SnapshotStore};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Get path to test fixtures directory
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Pipeline documents shipped with the tests
pub fn config_dir() -> Utf8PathBuf {
    fixtures_dir().join("config")
}

/// Get path to a specific fixture file
pub fn fixture(name: &str) -> Utf8PathBuf {
    fixtures_dir().join(name)
}

/// Service over the fixture documents, posix paths
pub fn service() -> Bifrost {
    let store = SnapshotStore::load(ConfigSources::from_dir(config_dir()), EventLog::new())
        .expect("fixture config loads");
    Bifrost::new(Arc::new(store)).with_platform(Platform::Posix)
}

/// Copy of the fixture documents in a temp dir, for tests that rewrite them
pub fn writable_config() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = utf8(tmp.path());
    copy_tree(&config_dir(), &dir);
    (tmp, dir)
}

/// Empty directory to use as `ROOT`
pub fn scratch_root() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = utf8(tmp.path());
    (tmp, dir)
}

pub fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temp dir is utf-8")
}

fn copy_tree(from: &Utf8Path, to: &Utf8Path) {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(from).unwrap();
        let target = to.as_std_path().join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).unwrap();
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Shot context matching `shot_work_path`
pub fn shot_context(root: &str, shot: &str) -> Context {
    Context::builder()
        .set("ROOT", root)
        .set("SERIES", "s01")
        .set("EPISODE", "ep01")
        .shot("seq001", shot)
        .set("VERSION", "v002")
        .set("DEPARTMENT", "anim")
        .build()
}
